//! `chartscan images` command handler.
//!
//! Renders and extracts only. No token is needed and the container runtime is
//! never contacted.

use std::io::{self, Write};
use std::path::Path;

use chartscan_core::config::ChartscanConfig;
use chartscan_core::types::ImageReference;
use chartscan_manifest::{ConfiguredRenderer, ImageExtractor, ManifestRenderer, extractor_for};
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::ImagesArgs;
use crate::commands::{apply_render_flags, resolve_input_dir};
use crate::error::CliError;
use crate::output::{OutputTarget, OutputWriter, Render};

/// Images discovered in a chart, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ImageList {
    pub images: Vec<ImageReference>,
}

impl Render for ImageList {
    fn render_text(&self, w: &mut dyn Write) -> io::Result<()> {
        for image in &self.images {
            writeln!(w, "{image}")?;
        }
        Ok(())
    }
}

/// Execute the `images` command.
pub async fn execute(args: ImagesArgs, mut config: ChartscanConfig) -> Result<(), CliError> {
    apply_render_flags(&mut config, args.renderer, args.extractor);
    config.validate()?;

    let input_dir = resolve_input_dir(&args.input_dir)?;
    let list = discover(&input_dir, &config).await?;

    OutputWriter::new(args.format, OutputTarget::Stdout).render(&list)?;
    Ok(())
}

/// Render the directory and extract its image references.
pub async fn discover(input_dir: &Path, config: &ChartscanConfig) -> Result<ImageList, CliError> {
    let renderer = ConfiguredRenderer::from_config(&config.render);
    debug!(renderer = renderer.name(), dir = %input_dir.display(), "rendering manifests");

    let text = renderer
        .render(input_dir)
        .await?
        .enforce(config.render.on_error)?;

    let extractor = extractor_for(config.render.extractor);
    let images = extractor.extract(&text)?;
    info!(extractor = extractor.name(), count = images.len(), "images discovered");

    Ok(ImageList {
        images: images.into_iter().collect(),
    })
}
