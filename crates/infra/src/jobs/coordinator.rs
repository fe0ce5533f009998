//! Job coordinator: bridges synchronous submissions to background execution.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use docforge_core::{DomainError, ExtractionRequest, JobId, SubmissionInput};

use super::store::{JobStore, JobStoreError};
use super::types::{Job, JobStats};
use crate::operation::{ExternalOperation, OperationError};

/// Coordinator configuration.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Upper bound on a single external operation
    pub operation_timeout: Duration,
    /// Maximum operations running at once; later jobs wait in `processing`
    pub max_concurrent: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            operation_timeout: Duration::from_secs(600),
            max_concurrent: 4,
        }
    }
}

impl CoordinatorConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }
}

/// Submission error.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] JobStoreError),
}

/// Accepts submissions, launches the external operation detached from the
/// caller, and answers status queries.
///
/// The spawned task is the only writer of its job's transition.
pub struct JobCoordinator<S: JobStore> {
    store: Arc<S>,
    operation: Arc<dyn ExternalOperation>,
    permits: Arc<Semaphore>,
    config: CoordinatorConfig,
}

impl<S: JobStore + 'static> JobCoordinator<S> {
    pub fn new(store: S, operation: Arc<dyn ExternalOperation>, config: CoordinatorConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            store: Arc::new(store),
            operation,
            permits,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Validate, register a `processing` job and launch its operation.
    ///
    /// Returns as soon as the record exists; never waits for the operation
    /// or for a concurrency permit. Must be called within a tokio runtime.
    pub fn submit(&self, input: SubmissionInput) -> Result<JobId, SubmitError> {
        let request = input.validate()?;
        let id = JobId::new();

        if let Err(e) = self.store.create(id) {
            error!(job_id = %id, error = %e, "failed to register job");
            return Err(e.into());
        }

        info!(job_id = %id, url = %request.url, kind = %request.kind, "job submitted");
        self.launch(id, request);
        Ok(id)
    }

    /// Current snapshot of a job.
    pub fn status(&self, id: JobId) -> Result<Job, JobStoreError> {
        self.store.get(id)
    }

    pub fn list(&self, limit: usize) -> Result<Vec<Job>, JobStoreError> {
        self.store.list(limit)
    }

    pub fn stats(&self) -> Result<JobStats, JobStoreError> {
        self.store.stats()
    }

    fn launch(&self, id: JobId, request: ExtractionRequest) {
        let operation = self.operation.clone();
        let permits = self.permits.clone();
        let timeout = self.config.operation_timeout;

        // Runs the operation in its own task so a panic stays contained there.
        let work = tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| OperationError::other("coordinator is shutting down"))?;
            debug!(job_id = %id, "operation started");

            match tokio::time::timeout(timeout, operation.run(id, request)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(OperationError::TimedOut(timeout)),
            }
        });

        let store = self.store.clone();
        tokio::spawn(async move {
            let outcome = match work.await {
                Ok(outcome) => outcome.map_err(|e| e.to_string()),
                Err(e) if e.is_panic() => Err(format!(
                    "operation panicked: {}",
                    panic_message(e.into_panic())
                )),
                Err(e) => Err(format!("operation aborted: {e}")),
            };
            record_outcome(&*store, id, outcome);
        });
    }
}

/// Terminal write for one job. Never propagates: a store error here means an
/// invariant broke (or the record was purged) and is only logged.
fn record_outcome<S: JobStore + ?Sized>(
    store: &S,
    id: JobId,
    outcome: Result<serde_json::Value, String>,
) {
    let recorded = match outcome {
        Ok(result) => store
            .mark_completed(id, result)
            .inspect(|_| info!(job_id = %id, "job completed")),
        Err(message) => {
            warn!(job_id = %id, error = %message, "job failed");
            store.mark_failed(id, message)
        }
    };

    if let Err(e) = recorded {
        error!(job_id = %id, error = %e, "failed to record job outcome");
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
