//! PaDEL-Descriptor process adapter
//!
//! Runs the PaDEL-Descriptor jar as a child process against a workspace:
//! salts removed, nitro groups standardized, fingerprint descriptors only,
//! with the descriptor types taken from an XML configuration file.

use super::{DescriptorEngine, DescriptorTable};
use crate::blocking::run_blocking;
use crate::error::{ExternalToolKind, PipelineError, Result};
use crate::workspace::Workspace;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Longest diagnostic excerpt carried in an error
const MAX_DIAGNOSTIC_CHARS: usize = 4000;

/// Launch parameters for PaDEL-Descriptor
#[derive(Debug, Clone)]
pub struct PadelSettings {
    /// Java launcher
    pub java: PathBuf,
    /// PaDEL-Descriptor jar
    pub jar: PathBuf,
    /// Descriptor type configuration (e.g. PubchemFingerprinter.xml)
    pub descriptor_types: PathBuf,
    /// JVM heap size, used for both the initial and maximum bound
    pub heap: String,
    /// Wall-clock limit for one invocation
    pub timeout: Duration,
}

/// [`DescriptorEngine`] backed by a PaDEL-Descriptor child process
#[derive(Debug, Clone)]
pub struct PadelEngine {
    settings: PadelSettings,
}

impl PadelEngine {
    pub fn new(settings: PadelSettings) -> Self {
        Self { settings }
    }

    /// Full argument list passed to the java launcher for `workspace`
    pub fn arguments(&self, workspace: &Workspace) -> Vec<OsString> {
        let s = &self.settings;
        vec![
            format!("-Xms{}", s.heap).into(),
            format!("-Xmx{}", s.heap).into(),
            "-Djava.awt.headless=true".into(),
            "-jar".into(),
            s.jar.clone().into_os_string(),
            "-removesalt".into(),
            "-standardizenitro".into(),
            "-fingerprints".into(),
            "-descriptortypes".into(),
            s.descriptor_types.clone().into_os_string(),
            "-dir".into(),
            workspace.path().as_os_str().to_os_string(),
            "-file".into(),
            workspace.descriptor_file().into_os_string(),
        ]
    }
}

#[async_trait]
impl DescriptorEngine for PadelEngine {
    fn name(&self) -> &str {
        "padel"
    }

    async fn compute(&self, workspace: &Workspace) -> Result<DescriptorTable> {
        let output_path = workspace.descriptor_file();
        info!(
            java = %self.settings.java.display(),
            workspace = %workspace.path().display(),
            molecules = workspace.staged_molecules(),
            "Running PaDEL-Descriptor"
        );

        let mut command = Command::new(&self.settings.java);
        command
            .args(self.arguments(workspace))
            .current_dir(workspace.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = Instant::now();
        let output = match tokio::time::timeout(self.settings.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(PipelineError::external(
                    ExternalToolKind::Exec,
                    format!("cannot launch {}: {}", self.settings.java.display(), e),
                ));
            },
            Err(_) => {
                warn!(
                    timeout_secs = self.settings.timeout.as_secs(),
                    "PaDEL-Descriptor timed out; process killed"
                );
                return Err(PipelineError::external(
                    ExternalToolKind::Timeout,
                    format!("no result after {} second(s)", self.settings.timeout.as_secs()),
                ));
            },
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if !output.status.success() {
            let mut diagnostic = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if diagnostic.is_empty() {
                diagnostic = String::from_utf8_lossy(&output.stdout).trim().to_string();
            }
            return Err(PipelineError::external(
                ExternalToolKind::Exec,
                format!("{}: {}", output.status, truncate(&diagnostic)),
            ));
        }

        debug!(elapsed_ms, "PaDEL-Descriptor finished");

        if !output_path.is_file() {
            return Err(PipelineError::external(
                ExternalToolKind::Parse,
                format!("engine exited cleanly but wrote no {}", output_path.display()),
            ));
        }

        run_blocking("descriptor parse", move || DescriptorTable::from_path(&output_path)).await
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_DIAGNOSTIC_CHARS {
        return text.to_string();
    }
    let tail: String = text
        .chars()
        .rev()
        .take(MAX_DIAGNOSTIC_CHARS)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("...{}", tail)
}
