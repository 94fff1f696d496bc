//! Subcommand implementations and shared setup.

pub mod images;
pub mod scan;

use std::path::{Path, PathBuf};

use chartscan_core::config::ChartscanConfig;
use chartscan_core::types::{ExtractorKind, RendererKind};

use crate::cli::Cli;
use crate::error::CliError;

/// Load configuration: file (if given) or defaults, then env overrides, then
/// the global `--log-level` flag. Subcommand flags are applied by each command.
pub async fn load_config(cli: &Cli) -> Result<ChartscanConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => ChartscanConfig::load(path).await?,
        None => ChartscanConfig::from_env()?,
    };

    if let Some(level) = &cli.log_level {
        config.general.log_level = level.to_lowercase();
        config.validate()?;
    }

    Ok(config)
}

/// Apply the renderer/extractor flags shared by both subcommands.
pub(crate) fn apply_render_flags(
    config: &mut ChartscanConfig,
    renderer: Option<RendererKind>,
    extractor: Option<ExtractorKind>,
) {
    if let Some(renderer) = renderer {
        config.render.renderer = renderer;
    }
    if let Some(extractor) = extractor {
        config.render.extractor = extractor;
    }
}

/// `.` resolves to the current working directory.
pub(crate) fn resolve_input_dir(input_dir: &Path) -> Result<PathBuf, CliError> {
    if input_dir == Path::new(".") {
        Ok(std::env::current_dir()?)
    } else {
        Ok(input_dir.to_path_buf())
    }
}
