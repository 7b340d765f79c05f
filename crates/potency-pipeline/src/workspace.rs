//! Per-request staging directories
//!
//! Each pipeline run gets its own uniquely named directory holding the staged
//! molecule file and the raw descriptor output. The directory is removed when
//! the [`Workspace`] is closed or dropped, whichever comes first, so every exit
//! path (including panics and cancelled futures) cleans up after itself.

use crate::error::{PipelineError, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Name of the staged molecule file inside a workspace
pub const MOLECULE_FILE: &str = "molecules.smi";

/// Name of the descriptor engine's output file inside a workspace
pub const DESCRIPTOR_FILE: &str = "descriptors_output.csv";

const WORKSPACE_PREFIX: &str = "potency-";

/// Hands out isolated workspaces under a common parent directory
#[derive(Debug, Clone, Default)]
pub struct WorkspaceManager {
    root: Option<PathBuf>,
}

impl WorkspaceManager {
    /// Workspaces are created under `root`, or the system temp dir when `None`
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// Create a fresh, exclusively owned workspace
    pub fn acquire(&self) -> Result<Workspace> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let dir = match &self.root {
            Some(root) => {
                std::fs::create_dir_all(root).map_err(|e| {
                    PipelineError::internal(format!(
                        "cannot create workspace root {}: {}",
                        root.display(),
                        e
                    ))
                })?;
                builder.tempdir_in(root)
            },
            None => builder.tempdir(),
        }
        .map_err(|e| PipelineError::internal(format!("cannot create workspace: {}", e)))?;

        debug!(path = %dir.path().display(), "Acquired workspace");

        Ok(Workspace {
            dir,
            staged_molecules: 0,
        })
    }
}

/// A staging directory owned by exactly one pipeline run
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    staged_molecules: usize,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where the molecule list for the descriptor engine is written
    pub fn molecule_file(&self) -> PathBuf {
        self.dir.path().join(MOLECULE_FILE)
    }

    /// Where the descriptor engine is told to write its output
    pub fn descriptor_file(&self) -> PathBuf {
        self.dir.path().join(DESCRIPTOR_FILE)
    }

    /// Number of molecules written to the staged molecule file
    pub fn staged_molecules(&self) -> usize {
        self.staged_molecules
    }

    pub(crate) fn set_staged_molecules(&mut self, count: usize) {
        self.staged_molecules = count;
    }

    /// Delete the directory and everything in it
    pub fn close(self) -> std::io::Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!(path = %path.display(), "Released workspace");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_workspaces_are_unique_and_removed() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(Some(root.path().to_path_buf()));

        let first = manager.acquire().unwrap();
        let second = manager.acquire().unwrap();
        assert_ne!(first.path(), second.path());
        assert!(first.path().starts_with(root.path()));

        std::fs::write(first.molecule_file(), "CCO\tmol1\n").unwrap();
        let first_path = first.path().to_path_buf();
        first.close().unwrap();
        assert!(!first_path.exists());

        let second_path = second.path().to_path_buf();
        drop(second);
        assert!(!second_path.exists());
    }

    #[test]
    fn test_missing_root_is_created() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        let manager = WorkspaceManager::new(Some(nested.clone()));

        let workspace = manager.acquire().unwrap();
        assert!(workspace.path().starts_with(&nested));
        assert_eq!(workspace.staged_molecules(), 0);
        assert!(workspace
            .descriptor_file()
            .ends_with(DESCRIPTOR_FILE));
    }
}
