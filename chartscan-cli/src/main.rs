//! chartscan -- Helm chart image discovery and vulnerability scanning.

use std::process::ExitCode;

use chartscan_cli::cli::Cli;
use chartscan_cli::error::CliError;
use chartscan_cli::{commands, logging};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match commands::load_config(&cli).await {
        Ok(config) => config,
        Err(e) => return fail(&e),
    };

    if let Err(e) = logging::init_tracing(&config.general) {
        eprintln!("error: {e}");
        return ExitCode::from(1);
    }
    chartscan_core::metrics::describe_all();

    match chartscan_cli::run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, exit_code = e.exit_code(), "command failed");
            fail(&e)
        }
    }
}

fn fail(e: &CliError) -> ExitCode {
    eprintln!("error: {e}");
    ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
}
