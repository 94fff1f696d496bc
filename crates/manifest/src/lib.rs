#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error type (`ManifestError`)
//! - [`chart`]: Chart descriptor loader (`ChartDescriptor`)
//! - [`render`]: Rendering boundary (`ManifestRenderer` trait, `HelmRenderer`, `FilesRenderer`)
//! - [`extract`]: Image reference extraction (`ImageExtractor` trait, line and structured strategies)

pub mod chart;
pub mod error;
pub mod extract;
pub mod render;

// --- Public API Re-exports ---

pub use chart::{CHART_DESCRIPTOR_FILE, ChartDescriptor};
pub use error::ManifestError;
pub use extract::{
    ImageExtractor, ImageSet, LineImageExtractor, StructuredImageExtractor, extractor_for,
};
pub use render::{ConfiguredRenderer, FilesRenderer, HelmRenderer, ManifestRenderer, RenderOutput};
