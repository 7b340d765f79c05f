//! Process-level tests for the PaDEL-Descriptor adapter
//!
//! A small shell script stands in for the java launcher. Each test writes its
//! own script, so the tests run serially to keep freshly written executables
//! away from concurrent forks.

#![cfg(unix)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use potency_pipeline::descriptors::{compute_aligned, stage_molecules};
use potency_pipeline::{
    DescriptorEngine, ExternalToolKind, MoleculeRecord, PadelEngine, PadelSettings, PipelineError,
    Workspace, WorkspaceManager,
};
use serial_test::serial;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Writes one `Name,PubchemFP1,PubchemFP2` row per staged molecule to the
/// path given as the last argument.
const FINGERPRINT_SCRIPT: &str = r#"#!/bin/sh
eval out=\${$#}
printf 'Name,PubchemFP1,PubchemFP2\n' > "$out"
tab=$(printf '\t')
while IFS="$tab" read -r smiles id; do
  printf '%s,1,0\n' "$id" >> "$out"
done < molecules.smi
"#;

const CRASH_SCRIPT: &str = r#"#!/bin/sh
echo "Exception in thread main: java.lang.OutOfMemoryError" >&2
exit 1
"#;

const HANG_SCRIPT: &str = "#!/bin/sh\nexec sleep 30\n";

const SILENT_SCRIPT: &str = "#!/bin/sh\nexit 0\n";

/// Writes a header but only the first staged molecule
const SHORT_SCRIPT: &str = r#"#!/bin/sh
eval out=\${$#}
printf 'Name,PubchemFP1\nfirst,1\n' > "$out"
"#;

struct Fixture {
    _bin: TempDir,
    root: TempDir,
    launcher: PathBuf,
}

impl Fixture {
    fn new(script: &str) -> Self {
        let bin = tempfile::tempdir().unwrap();
        let launcher = bin.path().join("java");
        std::fs::write(&launcher, script).unwrap();
        std::fs::set_permissions(&launcher, std::fs::Permissions::from_mode(0o755)).unwrap();

        Self {
            _bin: bin,
            root: tempfile::tempdir().unwrap(),
            launcher,
        }
    }

    fn engine(&self, timeout: Duration) -> PadelEngine {
        PadelEngine::new(PadelSettings {
            java: self.launcher.clone(),
            jar: PathBuf::from("PaDEL-Descriptor.jar"),
            descriptor_types: PathBuf::from("PubchemFingerprinter.xml"),
            heap: "1G".to_string(),
            timeout,
        })
    }

    async fn workspace(&self, records: &[MoleculeRecord]) -> Workspace {
        let mut workspace = WorkspaceManager::new(Some(self.root.path().to_path_buf()))
            .acquire()
            .unwrap();
        stage_molecules(&mut workspace, records).await.unwrap();
        workspace
    }

    fn root(&self) -> &Path {
        self.root.path()
    }
}

fn molecules() -> Vec<MoleculeRecord> {
    vec![
        MoleculeRecord::new("CCO", "mol1"),
        MoleculeRecord::new("CCN", "mol2"),
    ]
}

fn assert_kind(err: PipelineError, expected: ExternalToolKind) -> String {
    match err {
        PipelineError::ExternalTool { kind, diagnostic } => {
            assert_eq!(kind, expected, "diagnostic: {}", diagnostic);
            diagnostic
        },
        other => panic!("expected external tool error, got {other}"),
    }
}

#[tokio::test]
#[serial]
async fn test_engine_output_is_parsed() {
    let fixture = Fixture::new(FINGERPRINT_SCRIPT);
    let workspace = fixture.workspace(&molecules()).await;

    let table = compute_aligned(&fixture.engine(Duration::from_secs(10)), &workspace)
        .await
        .unwrap();

    assert_eq!(table.shape(), (2, 2));
    assert_eq!(table.names(), &["mol1".to_string(), "mol2".to_string()]);
    assert_eq!(table.columns(), &["PubchemFP1".to_string(), "PubchemFP2".to_string()]);
    assert!(workspace.descriptor_file().is_file());

    workspace.close().unwrap();
    assert_eq!(std::fs::read_dir(fixture.root()).unwrap().count(), 0);
}

#[tokio::test]
#[serial]
async fn test_non_zero_exit_carries_stderr() {
    let fixture = Fixture::new(CRASH_SCRIPT);
    let workspace = fixture.workspace(&molecules()).await;

    let err = fixture
        .engine(Duration::from_secs(10))
        .compute(&workspace)
        .await
        .unwrap_err();

    let diagnostic = assert_kind(err, ExternalToolKind::Exec);
    assert!(diagnostic.contains("OutOfMemoryError"));
}

#[tokio::test]
#[serial]
async fn test_slow_engine_is_killed_after_timeout() {
    let fixture = Fixture::new(HANG_SCRIPT);
    let workspace = fixture.workspace(&molecules()).await;

    let started = std::time::Instant::now();
    let err = fixture
        .engine(Duration::from_secs(1))
        .compute(&workspace)
        .await
        .unwrap_err();

    assert_kind(err, ExternalToolKind::Timeout);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
#[serial]
async fn test_clean_exit_without_output_is_parse_error() {
    let fixture = Fixture::new(SILENT_SCRIPT);
    let workspace = fixture.workspace(&molecules()).await;

    let err = fixture
        .engine(Duration::from_secs(10))
        .compute(&workspace)
        .await
        .unwrap_err();

    assert_kind(err, ExternalToolKind::Parse);
}

#[tokio::test]
#[serial]
async fn test_short_output_is_alignment_error() {
    let fixture = Fixture::new(SHORT_SCRIPT);
    let workspace = fixture.workspace(&molecules()).await;

    let err = compute_aligned(&fixture.engine(Duration::from_secs(10)), &workspace)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Alignment {
            expected: 2,
            actual: 1
        }
    ));
}
