use directories::UserDirs;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub name: Option<String>,
}

/// Timer periods. Both debounce constants are tunable per profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Mouse-down must be held this long before it counts as a grab.
    pub drag_delay_ms: u64,
    /// Snap coordinator poll period; also the minimum scroll pause before a snap.
    pub poll_interval_ms: u64,
    /// Animation frame period of the host runtime.
    pub frame_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            drag_delay_ms: 50,
            poll_interval_ms: 200,
            frame_ms: 16,
        }
    }
}

impl Timings {
    pub fn drag_delay(&self) -> Duration {
        Duration::from_millis(self.drag_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleThresholds {
    pub settle_frames: u32,
    pub max_frames: u32,
}

impl Default for IdleThresholds {
    fn default() -> Self {
        Self {
            settle_frames: 20,
            max_frames: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeThresholds {
    /// Net horizontal drag distance that turns a release into a swipe.
    pub distance_threshold: f64,
    /// Press-to-click displacement above which a click is swallowed.
    pub click_tolerance: f64,
    /// Duration hint handed to the navigator, in seconds.
    pub goto_duration_s: f64,
}

impl Default for SwipeThresholds {
    fn default() -> Self {
        Self {
            distance_threshold: 60.0,
            click_tolerance: 1.0,
            goto_duration_s: 0.3,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub meta: Meta,
    pub timings: Timings,
    pub idle: IdleThresholds,
    pub swipe: SwipeThresholds,
}

impl Profile {
    pub fn from_toml_str(txt: &str, origin: &Path) -> Result<Self, ConfigError> {
        let profile: Profile = toml::from_str(txt).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        validate_profile(&profile)?;
        Ok(profile)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let txt = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&txt, path)
    }

    pub fn display_name(&self) -> &str {
        self.meta.name.as_deref().unwrap_or("unnamed")
    }
}

/// Directory of named `*.toml` profiles.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    pub profiles_dir: PathBuf,
}

fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

fn config_dir() -> Result<PathBuf, ConfigError> {
    let home = UserDirs::new()
        .ok_or(ConfigError::NoConfigDir)?
        .home_dir()
        .to_path_buf();
    Ok(home.join(".config").join("snapctl"))
}

impl ProfileStore {
    /// Opens `~/.config/snapctl/profiles`, installing the default profile on first use.
    pub fn open_default() -> Result<Self, ConfigError> {
        Self::open_at(config_dir()?.join("profiles"))
    }

    pub fn open_at(profiles_dir: PathBuf) -> Result<Self, ConfigError> {
        fs::create_dir_all(&profiles_dir).map_err(|source| ConfigError::Write {
            path: profiles_dir.clone(),
            source,
        })?;

        let def_path = profiles_dir.join("default.toml");
        if !def_path.exists() {
            fs::write(&def_path, default_profile_text()).map_err(|source| ConfigError::Write {
                path: def_path.clone(),
                source,
            })?;
            info!("installed default profile at {}", def_path.display());
        }

        Ok(Self { profiles_dir })
    }

    pub fn list_profiles(&self) -> Vec<String> {
        let mut v = Vec::new();
        if let Ok(rd) = fs::read_dir(&self.profiles_dir) {
            for e in rd.flatten() {
                let path = e.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        v.push(stem.to_string());
                    }
                }
            }
        }
        v.sort();
        v
    }

    pub fn load_profile(&self, name: &str) -> Result<Profile, ConfigError> {
        let path = self.profiles_dir.join(format!("{name}.toml"));
        if !path.exists() {
            return Err(ConfigError::UnknownProfile(name.to_string()));
        }
        let mut profile = Profile::load(&path)?;
        if profile.meta.name.is_none() {
            profile.meta.name = Some(name.to_string());
        }
        Ok(profile)
    }
}

/// Upper bound for every `timings.*_ms` value.
pub const MAX_TIMING_MS: u64 = 60_000;

pub fn validate_profile(p: &Profile) -> Result<(), ConfigError> {
    let t = &p.timings;
    for (key, v) in [
        ("timings.drag_delay_ms", t.drag_delay_ms),
        ("timings.poll_interval_ms", t.poll_interval_ms),
        ("timings.frame_ms", t.frame_ms),
    ] {
        if v > MAX_TIMING_MS {
            return Err(ConfigError::Invalid(format!(
                "{key} must be at most {MAX_TIMING_MS}, got {v}"
            )));
        }
    }
    if t.poll_interval_ms == 0 || t.frame_ms == 0 {
        return Err(ConfigError::Invalid(
            "timings.poll_interval_ms and timings.frame_ms must be positive".into(),
        ));
    }
    if p.idle.settle_frames == 0 {
        return Err(ConfigError::Invalid(
            "idle.settle_frames must be positive".into(),
        ));
    }
    if p.idle.max_frames < p.idle.settle_frames {
        return Err(ConfigError::Invalid(format!(
            "idle.max_frames ({}) must be >= idle.settle_frames ({})",
            p.idle.max_frames, p.idle.settle_frames
        )));
    }

    let s = &p.swipe;
    for (key, v) in [
        ("swipe.distance_threshold", s.distance_threshold),
        ("swipe.click_tolerance", s.click_tolerance),
        ("swipe.goto_duration_s", s.goto_duration_s),
    ] {
        if !v.is_finite() || v < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "{key} must be a finite non-negative number, got {v}"
            )));
        }
    }
    Ok(())
}
