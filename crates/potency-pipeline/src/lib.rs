//! Potency Prediction Pipeline
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Turns a list of molecules (SMILES plus compound ID) into a ranked table of
//! predicted pIC50 values:
//!
//! 1. **Input**: parse the upload into [`MoleculeRecord`]s
//! 2. **Descriptors**: stage the molecules in a private [`Workspace`] and run a
//!    [`DescriptorEngine`] over them
//! 3. **Features**: project the descriptor table onto the model's [`FeatureSchema`]
//! 4. **Model**: score every row with the loaded [`ModelArtifact`]
//! 5. **Report**: pair scores with compound IDs and sort by potency
//!
//! # Example
//!
//! ```no_run
//! use potency_pipeline::{InputFormat, Pipeline, PipelineConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = PipelineConfig::load();
//! config.validate()?;
//! let pipeline = Pipeline::from_config(&config);
//!
//! let run = pipeline
//!     .run(b"CCO mol1\nCCN mol2\n", InputFormat::Whitespace)
//!     .await?;
//! for result in run.report.results() {
//!     println!("{}\t{:.3}", result.compound_id, result.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
mod blocking;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod features;
pub mod input;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod workspace;

pub use artifacts::ArtifactStore;
pub use config::PipelineConfig;
pub use descriptors::{DescriptorEngine, DescriptorTable, PadelEngine, PadelSettings};
pub use error::{ExternalToolKind, PipelineError, PipelineFailure, Result, Stage};
pub use features::{FeatureMatrix, FeatureSchema};
pub use input::{InputFormat, MoleculeRecord};
pub use model::{Estimator, ModelArtifact, RegressionTree};
pub use pipeline::{Pipeline, PredictionRun, StageHook};
pub use report::{PredictionReport, PredictionResult, REPORT_FILE_NAME};
pub use workspace::{Workspace, WorkspaceManager};
