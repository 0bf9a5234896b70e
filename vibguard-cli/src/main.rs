//! `vibguard` - VC-level classification of archived beamline vibration

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

mod cli;
mod commands;
mod output;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::run(cli, &mut out).await
}

/// `RUST_LOG` overrides the level picked by `-v`/`-q`
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
