//! Process-wide model state
//!
//! The model artifact and its feature schema never change while the process
//! runs. [`ArtifactStore`] loads each of them at most once, on first use, and
//! hands out shared read-only handles. Concurrent first callers block on the
//! same load instead of racing; a failed load is not remembered, so a later
//! request tries again.
//!
//! Async callers go through [`ArtifactStore::load_model`] and
//! [`ArtifactStore::load_schema`], which do the file reads and JSON parsing on
//! the blocking pool.

use crate::blocking::run_blocking;
use crate::error::Result;
use crate::features::FeatureSchema;
use crate::model::ModelArtifact;
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct ArtifactStore {
    model_path: PathBuf,
    schema_path: PathBuf,
    model: OnceCell<Arc<ModelArtifact>>,
    schema: OnceCell<Arc<FeatureSchema>>,
}

impl ArtifactStore {
    /// Store that lazily loads from the given files
    pub fn new(model_path: impl Into<PathBuf>, schema_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            schema_path: schema_path.into(),
            model: OnceCell::new(),
            schema: OnceCell::new(),
        }
    }

    /// Store around artifacts that are already in memory
    pub fn from_loaded(model: ModelArtifact, schema: FeatureSchema) -> Self {
        Self {
            model_path: PathBuf::new(),
            schema_path: PathBuf::new(),
            model: OnceCell::with_value(Arc::new(model)),
            schema: OnceCell::with_value(Arc::new(schema)),
        }
    }

    /// The model artifact, loading it on first call
    pub fn model(&self) -> Result<Arc<ModelArtifact>> {
        self.model
            .get_or_try_init(|| -> Result<Arc<ModelArtifact>> {
                let model = ModelArtifact::load(&self.model_path)?;
                info!(
                    path = %self.model_path.display(),
                    n_features = model.n_features(),
                    sha256 = model.sha256().unwrap_or("-"),
                    "Loaded model artifact"
                );
                Ok(Arc::new(model))
            })
            .cloned()
    }

    /// The feature schema, loading it on first call
    pub fn schema(&self) -> Result<Arc<FeatureSchema>> {
        self.schema
            .get_or_try_init(|| -> Result<Arc<FeatureSchema>> {
                let schema = FeatureSchema::from_path(&self.schema_path)?;
                info!(
                    path = %self.schema_path.display(),
                    columns = schema.len(),
                    "Loaded feature schema"
                );
                Ok(Arc::new(schema))
            })
            .cloned()
    }

    /// [`ArtifactStore::model`] without blocking the calling async worker
    pub async fn load_model(self: &Arc<Self>) -> Result<Arc<ModelArtifact>> {
        if let Some(model) = self.model.get() {
            return Ok(Arc::clone(model));
        }
        let store = Arc::clone(self);
        run_blocking("model load", move || store.model()).await
    }

    /// [`ArtifactStore::schema`] without blocking the calling async worker
    pub async fn load_schema(self: &Arc<Self>) -> Result<Arc<FeatureSchema>> {
        if let Some(schema) = self.schema.get() {
            return Ok(Arc::clone(schema));
        }
        let store = Arc::clone(self);
        run_blocking("schema load", move || store.schema()).await
    }
}
