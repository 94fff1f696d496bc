//! CLI error types and exit code mapping

use chartscan_core::error::ChartscanError;
use chartscan_image_scanner::ScannerError;
use chartscan_manifest::ManifestError;

/// Errors surfaced to the user by the CLI.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration file, environment override or flag is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The scan token environment variable is missing or empty.
    #[error("scan token is missing: set the '{env_var}' environment variable")]
    MissingToken { env_var: String },

    /// Command execution failed.
    #[error("command failed: {0}")]
    Command(String),

    /// Report serialization or emission failed.
    #[error("failed to write report: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// I/O error while emitting output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error propagated from the library crates.
    #[error(transparent)]
    Core(#[from] ChartscanError),
}

impl From<ScannerError> for CliError {
    fn from(err: ScannerError) -> Self {
        Self::Core(err.into())
    }
}

impl From<ManifestError> for CliError {
    fn from(err: ManifestError) -> Self {
        Self::Core(err.into())
    }
}

impl CliError {
    /// Map errors to process exit codes.
    ///
    /// | Code | Meaning |
    /// |------|---------|
    /// | 1 | general / runtime failure |
    /// | 2 | configuration error, missing scan token |
    /// | 3 | chart descriptor, rendering or extraction failure |
    /// | 10 | I/O error while emitting the report |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::MissingToken { .. } => 2,
            Self::Command(_) => 1,
            Self::JsonSerialize(e) if e.is_io() => 10,
            Self::JsonSerialize(_) => 1,
            Self::Io(_) => 10,
            Self::Core(e) => match e {
                ChartscanError::Config(_) => 2,
                ChartscanError::Chart(_)
                | ChartscanError::Render(_)
                | ChartscanError::Extract(_)
                | ChartscanError::Io(_) => 3,
                ChartscanError::Runtime(_) | ChartscanError::Scan(_) => 1,
            },
        }
    }
}
