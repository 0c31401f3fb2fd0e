use crate::error::Result;
use crate::orchestrator::ResultSink;
use crate::summary::RunSummary;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A pipeline run executing on the runtime while the caller keeps going.
///
/// Artifacts become visible through [`GenerationHandle::snapshot`] as soon as
/// they are written, so a host can serve partial documentation immediately.
pub struct GenerationHandle {
    results: ResultSink,
    running: Arc<AtomicBool>,
    task: JoinHandle<Result<RunSummary>>,
}

impl GenerationHandle {
    pub(crate) fn spawn<F>(results: ResultSink, run: F) -> Self
    where
        F: Future<Output = Result<RunSummary>> + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let guard = RunningGuard(Arc::clone(&running));
        let task = tokio::spawn(async move {
            let _guard = guard;
            run.await
        });
        Self {
            results,
            running,
            task,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Artifacts written so far, in completion order
    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.results.snapshot()
    }

    /// Wait for the run to finish and return its summary
    pub async fn wait(self) -> Result<RunSummary> {
        self.task.await?
    }
}

/// Clears the running flag on completion, error or panic
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
