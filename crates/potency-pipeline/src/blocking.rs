//! Offloading synchronous file work from async tasks

use crate::error::{PipelineError, Result};

/// Run `work` on tokio's blocking pool and wait for it
///
/// A panic inside `work` surfaces as an internal error naming `what`.
pub(crate) async fn run_blocking<T, F>(what: &'static str, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| PipelineError::internal(format!("{} did not complete: {}", what, e)))?
}
