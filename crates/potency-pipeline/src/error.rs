//! Error taxonomy for the prediction pipeline
//!
//! Every error is fatal to the request that raised it. A failed run is reported
//! as a [`PipelineFailure`], which pairs the error with the [`Stage`] that was
//! active when it occurred.

use std::fmt;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Process exit code for a successful run
pub const EXIT_OK: i32 = 0;
/// Process exit code for malformed or unreadable input
pub const EXIT_INPUT: i32 = 2;
/// Process exit code for descriptor engine failures
pub const EXIT_EXTERNAL_TOOL: i32 = 3;
/// Process exit code for a descriptor table lacking a model feature
pub const EXIT_SCHEMA: i32 = 4;
/// Process exit code for model load or inference failures
pub const EXIT_MODEL: i32 = 5;
/// Process exit code for anything else
pub const EXIT_INTERNAL: i32 = 6;

/// How the external descriptor engine failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalToolKind {
    /// Could not be launched, or exited with a non-zero status
    Exec,
    /// Did not finish within the configured timeout and was killed
    Timeout,
    /// Exited cleanly but its output file is missing or malformed
    Parse,
}

impl fmt::Display for ExternalToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalToolKind::Exec => f.write_str("exited with an error"),
            ExternalToolKind::Timeout => f.write_str("timed out"),
            ExternalToolKind::Parse => f.write_str("produced unreadable output"),
        }
    }
}

/// Errors raised by pipeline components
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Upload could not be parsed into (SMILES, compound ID) rows
    #[error("invalid input: {0}")]
    InputFormat(String),

    /// The descriptor engine failed; `diagnostic` carries its stderr when available
    #[error("descriptor engine {kind}: {diagnostic}")]
    ExternalTool {
        kind: ExternalToolKind,
        diagnostic: String,
    },

    /// Descriptor output row count differs from the submitted molecule count
    #[error("descriptor output has {actual} row(s) but {expected} molecule(s) were submitted")]
    Alignment { expected: usize, actual: usize },

    /// A column required by the feature schema is absent from the descriptor table
    #[error("descriptor table is missing required feature column '{column}'")]
    SchemaMismatch { column: String },

    /// Model artifact or its feature schema could not be located or deserialized
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The model rejected the feature matrix
    #[error("model rejected input: {0}")]
    Inference(String),

    /// Staging, filesystem, or export failures
    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Create an input format error
    pub fn input(msg: impl Into<String>) -> Self {
        Self::InputFormat(msg.into())
    }

    /// Create an external tool error of the given kind
    pub fn external(kind: ExternalToolKind, diagnostic: impl Into<String>) -> Self {
        Self::ExternalTool {
            kind,
            diagnostic: diagnostic.into(),
        }
    }

    /// Create a model load error
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    /// Create an inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Exit code a process-level surface should use for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::InputFormat(_) => EXIT_INPUT,
            PipelineError::ExternalTool { .. } | PipelineError::Alignment { .. } => {
                EXIT_EXTERNAL_TOOL
            },
            PipelineError::SchemaMismatch { .. } => EXIT_SCHEMA,
            PipelineError::ModelLoad(_) | PipelineError::Inference(_) => EXIT_MODEL,
            PipelineError::Internal(_) => EXIT_INTERNAL,
        }
    }
}

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Validating,
    Staging,
    ComputingDescriptors,
    SelectingFeatures,
    Predicting,
    Assembling,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "input validation",
            Stage::Staging => "workspace staging",
            Stage::ComputingDescriptors => "descriptor computation",
            Stage::SelectingFeatures => "feature selection",
            Stage::Predicting => "prediction",
            Stage::Assembling => "report assembly",
        };
        f.write_str(name)
    }
}

/// A failed run: the stage that was active and the error it raised
#[derive(Error, Debug)]
#[error("{stage} failed: {error}")]
pub struct PipelineFailure {
    pub stage: Stage,
    #[source]
    pub error: PipelineError,
}

impl PipelineFailure {
    pub fn new(stage: Stage, error: PipelineError) -> Self {
        Self { stage, error }
    }

    /// Exit code of the underlying error
    pub fn exit_code(&self) -> i32 {
        self.error.exit_code()
    }
}
