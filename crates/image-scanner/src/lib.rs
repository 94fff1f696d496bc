#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error type (`ScannerError`)
//! - [`config`]: Scanner configuration (`ScannerConfig`, builder)
//! - [`runtime`]: Container runtime boundary (`ContainerRuntime` trait, `BollardRuntime`)
//! - [`report`]: Result accumulation (`ReportAccumulator`, `ScanRun`, `ImageFailure`)
//! - [`orchestrator`]: Main orchestrator (`ScanOrchestrator`, `ScanOrchestratorBuilder`)

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod runtime;

// --- Public API Re-exports ---

// Orchestrator
pub use orchestrator::{ScanOrchestrator, ScanOrchestratorBuilder};

// Configuration
pub use config::{ScannerConfig, ScannerConfigBuilder};

// Error
pub use error::ScannerError;

// Report
pub use report::{FailureStage, ImageFailure, ReportAccumulator, ScanRun};

// Runtime
pub use runtime::{BollardRuntime, ContainerRuntime, RunOutput, RunSpec, split_reference};
