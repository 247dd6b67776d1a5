use anyhow::{Context, Result, anyhow};
use pico_args::Arguments;
use std::{env, ffi::OsString, path::PathBuf};

use snapctl::config::{Profile, ProfileStore};
use snapctl::replay::{Trace, run_trace};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            match topic {
                Some(t) => print_subcmd_help(&t),
                None => print_help(),
            }
            Ok(())
        }

        Some("replay") => {
            let profile = resolve_profile(&mut pargs)?;
            let compact = pargs.contains("--compact");
            let path: PathBuf = pargs
                .free_from_os_str(|s| Ok::<_, std::convert::Infallible>(PathBuf::from(s)))
                .map_err(|_| anyhow!("usage: snapctl replay <trace.json> [--profile <name> | --config <path>]"))?;
            reject_leftovers(pargs.finish())?;

            let trace = Trace::from_path(&path)?;
            let report = run_trace(&trace, &profile);
            let out = if compact {
                serde_json::to_string(&report)?
            } else {
                serde_json::to_string_pretty(&report)?
            };
            println!("{out}");
            Ok(())
        }

        Some("profiles") => {
            let store = ProfileStore::open_default()?;
            for name in store.list_profiles() {
                println!("{name}");
            }
            Ok(())
        }

        Some("show") => {
            let name: Option<String> = pargs.free_from_str().ok();
            let store = ProfileStore::open_default()?;
            let profile = store.load_profile(name.as_deref().unwrap_or("default"))?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(())
        }

        Some("check") => {
            let path: PathBuf = pargs
                .free_from_os_str(|s| Ok::<_, std::convert::Infallible>(PathBuf::from(s)))
                .map_err(|_| anyhow!("usage: snapctl check <profile.toml>"))?;
            let profile = Profile::load(&path)?;
            println!("ok: {} ({})", path.display(), profile.display_name());
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn resolve_profile(pargs: &mut Arguments) -> Result<Profile> {
    let config: Option<PathBuf> = pargs.opt_value_from_os_str("--config", |s| {
        Ok::<_, std::convert::Infallible>(PathBuf::from(s))
    })?;
    let name: Option<String> = pargs.opt_value_from_str("--profile")?;

    match (config, name) {
        (Some(_), Some(_)) => Err(anyhow!("--config and --profile are mutually exclusive")),
        (Some(path), None) => {
            Profile::load(&path).with_context(|| format!("loading {}", path.display()))
        }
        (None, Some(name)) => Ok(ProfileStore::open_default()?.load_profile(&name)?),
        (None, None) => Ok(Profile::default()),
    }
}

fn reject_leftovers(rest: Vec<OsString>) -> Result<()> {
    if rest.is_empty() {
        return Ok(());
    }
    Err(anyhow!("unexpected arguments: {rest:?}"))
}

fn print_help() {
    println!(
        r#"snapctl — carousel gesture and snap controller

USAGE:
  snapctl help [command]                  Show general or command-specific help
  snapctl replay <trace.json> [options]   Replay an input trace and print the report
  snapctl profiles                        List stored profiles
  snapctl show [name]                     Print a stored profile (default: "default")
  snapctl check <profile.toml>            Validate a profile file

REPLAY OPTIONS:
  --profile <name>                        Use a stored profile
  --config <path>                         Use a profile file
  --compact                               Single-line JSON output

TIPS:
  - Profiles: ~/.config/snapctl/profiles
  - RUST_LOG=debug shows every grab, snap and focus transition
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "replay" => println!(
            "usage: snapctl replay <trace.json> [--profile <name> | --config <path>] [--compact]\nRuns the trace on a virtual clock and prints notices and final state as JSON."
        ),
        "profiles" => println!("usage: snapctl profiles\nLists profiles; installs the default on first use."),
        "show" => println!("usage: snapctl show [name]\nPrints the effective profile as JSON."),
        "check" => println!("usage: snapctl check <profile.toml>\nParses and validates a profile file."),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}
