//! Output emission for reports and listings
//!
//! Reports are always pretty-printed JSON. Listings support text or JSON.
//! All output goes to stdout unless a file target is given; logs go to stderr.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Where output is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    /// Created if missing, truncated if present.
    File(PathBuf),
}

impl OutputTarget {
    pub fn from_option(path: Option<&Path>) -> Self {
        match path {
            Some(p) => Self::File(p.to_path_buf()),
            None => Self::Stdout,
        }
    }
}

/// Output writer that renders a payload in the configured format.
pub struct OutputWriter {
    format: OutputFormat,
    target: OutputTarget,
}

impl OutputWriter {
    pub fn new(format: OutputFormat, target: OutputTarget) -> Self {
        Self { format, target }
    }

    /// Writer for the scan report: JSON, to a file or stdout.
    pub fn report(target: OutputTarget) -> Self {
        Self::new(OutputFormat::Json, target)
    }

    /// Render output to the configured target.
    pub fn render<T: Render + Serialize>(&self, data: &T) -> Result<(), CliError> {
        match &self.target {
            OutputTarget::Stdout => {
                let stdout = io::stdout();
                let mut lock = stdout.lock();
                self.render_to(data, &mut lock)
            }
            OutputTarget::File(path) => {
                let file = File::create(path)?;
                let mut writer = BufWriter::new(file);
                self.render_to(data, &mut writer)?;
                writer.flush()?;
                Ok(())
            }
        }
    }

    /// Render output to an arbitrary writer.
    pub fn render_to<T: Render + Serialize>(
        &self,
        data: &T,
        w: &mut dyn Write,
    ) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Text => data.render_text(w)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, data)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

/// Trait for types that can render themselves as human-readable text.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> io::Result<()>;
}

impl Render for chartscan_core::types::Report {
    fn render_text(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}", self.chart_label)?;
        for entry in &self.images {
            writeln!(w, "  {}", entry.image_name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartscan_core::types::{ImageEntry, Report, ScanOutcome};

    fn sample_report() -> Report {
        let mut report = Report::new("foo@1.2.3");
        report.images.push(ImageEntry {
            image_name: "a:1".into(),
            results: ScanOutcome::Skipped,
        });
        report
    }

    #[test]
    fn json_output_is_pretty_with_trailing_newline() {
        let writer = OutputWriter::report(OutputTarget::Stdout);
        let mut buf = Vec::new();
        writer.render_to(&sample_report(), &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("{\n  \"chartLabel\": \"foo@1.2.3\""));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn text_output_lists_images() {
        let writer = OutputWriter::new(OutputFormat::Text, OutputTarget::Stdout);
        let mut buf = Vec::new();
        writer.render_to(&sample_report(), &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "foo@1.2.3\n  a:1\n");
    }

    #[test]
    fn file_target_truncates_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        std::fs::write(&path, "x".repeat(4096)).unwrap();

        let writer = OutputWriter::report(OutputTarget::File(path.clone()));
        writer.render(&sample_report()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["chartLabel"], "foo@1.2.3");
        assert_eq!(value["images"][0]["results"], serde_json::json!({}));
    }

    #[test]
    fn unwritable_target_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.json");
        let writer = OutputWriter::report(OutputTarget::File(path));
        let err = writer.render(&sample_report()).unwrap_err();
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn target_from_option() {
        assert_eq!(OutputTarget::from_option(None), OutputTarget::Stdout);
        assert_eq!(
            OutputTarget::from_option(Some(Path::new("out.json"))),
            OutputTarget::File(PathBuf::from("out.json"))
        );
    }
}
