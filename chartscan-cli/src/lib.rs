//! chartscan command-line interface.
//!
//! The binary in `main.rs` is a thin wrapper: it parses arguments, loads
//! configuration, initializes logging and dispatches to [`run`].

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;

use chartscan_core::config::ChartscanConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;

/// Dispatch a parsed command with an already-loaded configuration.
pub async fn run(cli: Cli, config: ChartscanConfig) -> Result<(), CliError> {
    match cli.command {
        Commands::Scan(args) => commands::scan::execute(args, config).await,
        Commands::Images(args) => commands::images::execute(args, config).await,
    }
}
