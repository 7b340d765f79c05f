//! Descriptor engine adapter
//!
//! Molecules are staged into a [`Workspace`] as a headerless tab-separated
//! file (SMILES, then compound ID), an engine turns that file into a
//! [`DescriptorTable`], and [`compute_aligned`] checks that the engine returned
//! one row per staged molecule.
//!
//! The engine itself is behind the [`DescriptorEngine`] trait so the pipeline
//! does not care whether descriptors come from a local process, an in-process
//! library, or a remote service.

pub mod padel;
pub mod table;

pub use padel::{PadelEngine, PadelSettings};
pub use table::DescriptorTable;

use crate::error::{PipelineError, Result};
use crate::input::MoleculeRecord;
use crate::workspace::Workspace;
use async_trait::async_trait;
use tracing::debug;

/// Computes descriptors for the molecules staged in a workspace
#[async_trait]
pub trait DescriptorEngine: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Produce one descriptor row per staged molecule, in staged order
    ///
    /// Implementations may only write inside `workspace`.
    async fn compute(&self, workspace: &Workspace) -> Result<DescriptorTable>;
}

/// Write `records` into the workspace's molecule file
pub async fn stage_molecules(workspace: &mut Workspace, records: &[MoleculeRecord]) -> Result<()> {
    let path = workspace.molecule_file();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(Vec::new());
    for record in records {
        writer
            .write_record([record.smiles(), record.compound_id()])
            .map_err(|e| {
                PipelineError::internal(format!("cannot encode molecule {}: {}", record.compound_id(), e))
            })?;
    }
    let tsv = writer
        .into_inner()
        .map_err(|e| PipelineError::internal(format!("cannot encode molecules: {}", e)))?;

    tokio::fs::write(&path, tsv).await.map_err(|e| {
        PipelineError::internal(format!("cannot stage molecules to {}: {}", path.display(), e))
    })?;

    workspace.set_staged_molecules(records.len());
    debug!(molecules = records.len(), path = %path.display(), "Staged molecules");
    Ok(())
}

/// Run `engine` and verify its output has exactly one row per staged molecule
pub async fn compute_aligned(
    engine: &dyn DescriptorEngine,
    workspace: &Workspace,
) -> Result<DescriptorTable> {
    let table = engine.compute(workspace).await?;

    let expected = workspace.staged_molecules();
    if table.len() != expected {
        return Err(PipelineError::Alignment {
            expected,
            actual: table.len(),
        });
    }

    debug!(
        engine = engine.name(),
        rows = table.len(),
        columns = table.columns().len(),
        "Descriptor table aligned with input"
    );
    Ok(table)
}
