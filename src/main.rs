mod cli;
mod logging;

fn main() -> anyhow::Result<()> {
    logging::init();
    cli::run()
}
