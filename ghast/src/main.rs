use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ghast::Error;
use ghast::headless::{self, Options};
use tracing::error;
use tracing_subscriber::EnvFilter;
use wraith::Config;

#[derive(Debug, Parser)]
#[command(version, about = "Plays NES ROMs in a window")]
struct Args {
    /// The TOML config to read. A missing file means the defaults.
    #[arg(long, default_value = "ghast.toml")]
    config: PathBuf,
    /// Starts this ROM right away.
    #[arg(long)]
    rom: Option<String>,
    /// Runs without a window for a fixed number of ticks.
    #[arg(long)]
    headless: bool,
    /// Headless: clock ticks to run for.
    #[arg(long, requires = "headless")]
    steps: Option<u64>,
    /// Headless: render ticks to run for.
    #[arg(long, requires = "headless")]
    renders: Option<u64>,
    /// Headless: writes the last native frame to this PNG.
    #[arg(long, requires = "headless")]
    screenshot: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "Ghast stopped");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Error> {
    let config = Config::load(&args.config).map_err(Error::Config)?;
    if args.headless {
        let options = Options {
            rom: args.rom,
            steps: args.steps,
            renders: args.renders,
            screenshot: args.screenshot,
        };
        headless::run(&config, options)?;
        Ok(())
    } else {
        ghast::state::run(&config, args.rom)
    }
}
