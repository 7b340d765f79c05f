//! Error types for the potency CLI
//!
//! User-facing error types with actionable messages and a process exit code
//! for each.

use potency_pipeline::error::EXIT_INTERNAL;
use potency_pipeline::PipelineFailure;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    /// A pipeline run failed at some stage
    #[error(transparent)]
    Pipeline(#[from] PipelineFailure),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your POTENCY_* environment variables and command-line flags.")]
    Config(String),

    /// A result could not be written
    #[error("Export failed: {0}. Check the output path and disk space.")]
    Export(String),
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an export error
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Pipeline(failure) => failure.exit_code(),
            CliError::Config(_) | CliError::Export(_) => EXIT_INTERNAL,
        }
    }
}
