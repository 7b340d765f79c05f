//! Request orchestration
//!
//! A run moves strictly forward through the [`Stage`]s:
//!
//! ```text
//! Validating -> Staging -> ComputingDescriptors -> SelectingFeatures
//!            -> Predicting -> Assembling -> Done
//! ```
//!
//! Any stage may instead end the run in `Failed`, carrying the stage and its
//! error. The workspace acquired in `Staging` is released on both terminal
//! paths before control returns to the caller.

use crate::artifacts::ArtifactStore;
use crate::config::PipelineConfig;
use crate::descriptors::{compute_aligned, stage_molecules, DescriptorEngine, DescriptorTable, PadelEngine};
use crate::error::{PipelineError, PipelineFailure, Stage};
use crate::features::select;
use crate::input::{parse_molecules, InputFormat, MoleculeRecord};
use crate::report::PredictionReport;
use crate::workspace::{Workspace, WorkspaceManager};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Callback invoked on every stage transition
pub type StageHook = Arc<dyn Fn(Stage) + Send + Sync>;

type RunResult<T> = std::result::Result<T, PipelineFailure>;

/// Everything a successful run produced
#[derive(Debug, Clone)]
pub struct PredictionRun {
    pub request_id: Uuid,
    /// Normalized input, in submission order
    pub molecules: Vec<MoleculeRecord>,
    /// Raw engine output, one row per molecule
    pub descriptors: DescriptorTable,
    /// (rows, columns) of the matrix handed to the model
    pub feature_shape: (usize, usize),
    pub report: PredictionReport,
    /// SHA-256 of the model artifact used
    pub model_sha256: Option<String>,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// Runs molecule uploads through descriptors, feature selection, and the model
///
/// Cheap to clone; clones share the engine and the loaded artifacts, and each
/// run gets its own workspace.
#[derive(Clone)]
pub struct Pipeline {
    engine: Arc<dyn DescriptorEngine>,
    artifacts: Arc<ArtifactStore>,
    workspaces: WorkspaceManager,
    stage_hook: Option<StageHook>,
}

impl Pipeline {
    pub fn new(
        engine: Arc<dyn DescriptorEngine>,
        artifacts: Arc<ArtifactStore>,
        workspaces: WorkspaceManager,
    ) -> Self {
        Self {
            engine,
            artifacts,
            workspaces,
            stage_hook: None,
        }
    }

    /// PaDEL-backed pipeline with lazily loaded artifacts
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            Arc::new(PadelEngine::new(config.padel_settings())),
            Arc::new(ArtifactStore::new(&config.model_path, &config.schema_path)),
            WorkspaceManager::new(config.work_dir.clone()),
        )
    }

    /// Call `hook` whenever a run enters a new stage
    pub fn with_stage_hook(mut self, hook: StageHook) -> Self {
        self.stage_hook = Some(hook);
        self
    }

    /// Predict for an uploaded file, inferring the format from its extension
    /// unless `format` is given
    pub async fn run_file(
        &self,
        path: &Path,
        format: Option<InputFormat>,
    ) -> RunResult<PredictionRun> {
        self.instrumented(|mut tracker| async move {
            let records = read_input(path, format)
                .await
                .map_err(|e| tracker.fail(e))?;
            self.process(tracker, records).await
        })
        .await
    }

    /// Predict for raw upload bytes in the given format
    pub async fn run(&self, bytes: &[u8], format: InputFormat) -> RunResult<PredictionRun> {
        self.instrumented(|mut tracker| async move {
            let records = parse_molecules(bytes, format).map_err(|e| tracker.fail(e))?;
            self.process(tracker, records).await
        })
        .await
    }

    /// Predict for records that were already parsed
    pub async fn run_records(&self, records: Vec<MoleculeRecord>) -> RunResult<PredictionRun> {
        self.instrumented(|mut tracker| async move {
            if records.is_empty() {
                return Err(tracker.fail(PipelineError::input("no molecules found in input")));
            }
            self.process(tracker, records).await
        })
        .await
    }

    async fn instrumented<F, Fut>(&self, body: F) -> RunResult<PredictionRun>
    where
        F: FnOnce(StageTracker) -> Fut,
        Fut: std::future::Future<Output = RunResult<PredictionRun>>,
    {
        let request_id = Uuid::new_v4();
        let span = info_span!("prediction", request_id = %request_id);
        let tracker = StageTracker::new(request_id, self.stage_hook.clone());
        body(tracker).instrument(span).await
    }

    async fn process(
        &self,
        mut tracker: StageTracker,
        records: Vec<MoleculeRecord>,
    ) -> RunResult<PredictionRun> {
        info!(molecules = records.len(), "Input validated");

        tracker.advance(Stage::Staging);
        let mut workspace = self.workspaces.acquire().map_err(|e| tracker.fail(e))?;

        let outcome = self.run_in_workspace(&mut tracker, &mut workspace, &records).await;
        release(workspace);

        let computed = outcome?;
        let elapsed = tracker.started.elapsed();
        tracker.finish();

        info!(
            molecules = records.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            top = computed.report.top().map(|r| r.compound_id.as_str()).unwrap_or("-"),
            "Prediction complete"
        );

        Ok(PredictionRun {
            request_id: tracker.request_id,
            molecules: records,
            descriptors: computed.descriptors,
            feature_shape: computed.feature_shape,
            report: computed.report,
            model_sha256: computed.model_sha256,
            started_at: tracker.started_at,
            elapsed,
        })
    }

    async fn run_in_workspace(
        &self,
        tracker: &mut StageTracker,
        workspace: &mut Workspace,
        records: &[MoleculeRecord],
    ) -> RunResult<Computed> {
        stage_molecules(workspace, records)
            .await
            .map_err(|e| tracker.fail(e))?;

        tracker.advance(Stage::ComputingDescriptors);
        let descriptors = compute_aligned(self.engine.as_ref(), workspace)
            .await
            .map_err(|e| tracker.fail(e))?;
        info!(
            rows = descriptors.len(),
            columns = descriptors.columns().len(),
            "Descriptors computed"
        );

        tracker.advance(Stage::SelectingFeatures);
        let schema = self
            .artifacts
            .load_schema()
            .await
            .map_err(|e| tracker.fail(e))?;
        let matrix = select(&descriptors, &schema).map_err(|e| tracker.fail(e))?;

        tracker.advance(Stage::Predicting);
        let model = self
            .artifacts
            .load_model()
            .await
            .map_err(|e| tracker.fail(e))?;
        let scores = model.predict(&matrix).map_err(|e| tracker.fail(e))?;

        tracker.advance(Stage::Assembling);
        let report = PredictionReport::assemble(records, &scores).map_err(|e| tracker.fail(e))?;

        Ok(Computed {
            feature_shape: matrix.shape(),
            descriptors,
            report,
            model_sha256: model.sha256().map(str::to_string),
        })
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("engine", &self.engine.name())
            .field("artifacts", &self.artifacts)
            .field("workspaces", &self.workspaces)
            .finish()
    }
}

struct Computed {
    descriptors: DescriptorTable,
    feature_shape: (usize, usize),
    report: PredictionReport,
    model_sha256: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    Active(Stage),
    Done,
    Failed(Stage),
}

/// Current state of one run
struct StageTracker {
    request_id: Uuid,
    started_at: DateTime<Utc>,
    started: Instant,
    state: PipelineState,
    hook: Option<StageHook>,
}

impl StageTracker {
    fn new(request_id: Uuid, hook: Option<StageHook>) -> Self {
        let tracker = Self {
            request_id,
            started_at: Utc::now(),
            started: Instant::now(),
            state: PipelineState::Active(Stage::Validating),
            hook,
        };
        tracker.notify(Stage::Validating);
        tracker
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(
            matches!(self.state, PipelineState::Active(current) if current < next),
            "illegal transition from {:?} to {:?}",
            self.state,
            next
        );
        debug!(from = ?self.state, to = %next, "Stage transition");
        self.state = PipelineState::Active(next);
        self.notify(next);
    }

    fn fail(&mut self, error: PipelineError) -> PipelineFailure {
        let stage = match self.state {
            PipelineState::Active(stage) | PipelineState::Failed(stage) => stage,
            PipelineState::Done => Stage::Assembling,
        };
        warn!(stage = %stage, error = %error, "Stage failed");
        self.state = PipelineState::Failed(stage);
        PipelineFailure::new(stage, error)
    }

    fn finish(&mut self) {
        debug!(from = ?self.state, "Run done");
        self.state = PipelineState::Done;
    }

    fn notify(&self, stage: Stage) {
        if let Some(hook) = &self.hook {
            hook(stage);
        }
    }
}

async fn read_input(
    path: &Path,
    format: Option<InputFormat>,
) -> crate::error::Result<Vec<MoleculeRecord>> {
    let format = match format {
        Some(format) => format,
        None => InputFormat::from_path(path)?,
    };
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        PipelineError::input(format!("cannot read input file {}: {}", path.display(), e))
    })?;
    parse_molecules(&bytes, format)
}

fn release(workspace: Workspace) {
    let path = workspace.path().to_path_buf();
    if let Err(e) = workspace.close() {
        warn!(path = %path.display(), error = %e, "Failed to remove workspace");
    }
}
