//! `chartscan scan` command handler.
//!
//! Renders the chart, scans every discovered image and emits the JSON report.

use std::sync::Arc;

use chartscan_core::config::ChartscanConfig;
use chartscan_core::types::{FailurePolicy, ScanToken};
use chartscan_image_scanner::{BollardRuntime, ScanOrchestratorBuilder, ScanRun, ScannerConfig};
use chartscan_manifest::{ConfiguredRenderer, extractor_for};
use tracing::info;

use crate::cli::ScanArgs;
use crate::commands::{apply_render_flags, resolve_input_dir};
use crate::error::CliError;
use crate::output::{OutputTarget, OutputWriter};

/// Execute the `scan` command and write the report.
pub async fn execute(args: ScanArgs, config: ChartscanConfig) -> Result<(), CliError> {
    let run = run_scan(&args, config).await?;

    let target = OutputTarget::from_option(args.output.as_deref());
    OutputWriter::report(target).render(&run.report)?;

    if let Some(path) = &args.output {
        info!(path = %path.display(), "report written");
    }
    Ok(())
}

/// Run the orchestration and return the result without emitting it.
///
/// The scan token is checked before anything is rendered.
pub async fn run_scan(args: &ScanArgs, mut config: ChartscanConfig) -> Result<ScanRun, CliError> {
    apply_scan_flags(&mut config, args);
    config.validate()?;

    let token = require_token(&config.scanner.token_env)?;
    let input_dir = resolve_input_dir(&args.input_dir)?;

    let mut builder = ScanOrchestratorBuilder::<BollardRuntime, ConfiguredRenderer>::new()
        .config(ScannerConfig::from_core(&config))
        .renderer(ConfiguredRenderer::from_config(&config.render))
        .extractor(extractor_for(config.render.extractor))
        .token(token);

    // bollard checks the socket path on connect; --no-scan must work without Docker.
    if config.scanner.enabled {
        builder = builder.runtime(Arc::new(BollardRuntime::connect_with_socket(
            &config.scanner.docker_socket,
        )?));
    }

    let orchestrator = builder.build()?;

    let run = orchestrator.run(&input_dir).await?;
    info!(
        chart = %run.report.chart_label,
        reported = run.report.images.len(),
        dropped = run.failures.len(),
        "scan finished"
    );
    Ok(run)
}

/// Apply `scan` flags on top of file and env configuration.
pub(crate) fn apply_scan_flags(config: &mut ChartscanConfig, args: &ScanArgs) {
    apply_render_flags(config, args.renderer, args.extractor);

    if args.no_scan {
        config.scanner.enabled = false;
    }
    if args.fail_fast {
        config.render.on_error = FailurePolicy::FailFast;
        config.scanner.on_pull_error = FailurePolicy::FailFast;
    }
    if let Some(n) = args.concurrency {
        config.scanner.max_concurrent_scans = n;
    }
}

fn require_token(env_var: &str) -> Result<ScanToken, CliError> {
    ScanToken::from_env(env_var).map_err(|_| CliError::MissingToken {
        env_var: env_var.to_owned(),
    })
}
