//! CLI module for wallcycle.
//!
//! Every command runs in-process: the cycler lives as long as the command.

mod commands;
mod output;

use clap::Parser;
pub use commands::Cli;
use tracing_subscriber::EnvFilter;

use crate::error::WallcycleError;

/// Installs the stderr log subscriber.
///
/// `--verbose` forces debug output; otherwise `RUST_LOG` applies, defaulting to `info`.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Runs the CLI.
///
/// Parses command-line arguments and executes the appropriate command.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> Result<(), WallcycleError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    cli.execute()
}
