//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use chartscan_core::types::{ExtractorKind, RendererKind};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// chartscan -- find every container image a Helm chart deploys and scan each one.
///
/// Use `chartscan <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "chartscan", version, about, long_about = None)]
pub struct Cli {
    /// Path to a chartscan.toml configuration file (defaults are used when omitted).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One image reference per line.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a chart, scan every referenced image and emit a JSON report.
    Scan(ScanArgs),

    /// Render a chart and list the images it references.
    Images(ImagesArgs),
}

// ---- scan ----

/// Render, extract, scan and report.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Chart directory (or directory of rendered manifests with `--renderer files`).
    #[arg(default_value = ".")]
    pub input_dir: PathBuf,

    /// Write the report to this file instead of stdout (truncated if it exists).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// List images with empty results instead of scanning them.
    #[arg(long)]
    pub no_scan: bool,

    /// Image extraction strategy.
    #[arg(long)]
    pub extractor: Option<ExtractorKind>,

    /// Manifest renderer.
    #[arg(long)]
    pub renderer: Option<RendererKind>,

    /// Abort when the renderer or the scanner image pull fails.
    #[arg(long)]
    pub fail_fast: bool,

    /// Number of images scanned concurrently.
    #[arg(long)]
    pub concurrency: Option<usize>,
}

// ---- images ----

/// Render and extract only; the container runtime is never contacted.
#[derive(Args, Debug)]
pub struct ImagesArgs {
    /// Chart directory (or directory of rendered manifests with `--renderer files`).
    #[arg(default_value = ".")]
    pub input_dir: PathBuf,

    /// Image extraction strategy.
    #[arg(long)]
    pub extractor: Option<ExtractorKind>,

    /// Manifest renderer.
    #[arg(long)]
    pub renderer: Option<RendererKind>,

    /// Output format.
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}
