//! Core job types and the job state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docforge_core::JobId;

/// Externally visible job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// The external operation has been launched and has not finished yet
    Processing,
    /// The external operation returned a result
    Completed,
    /// The external operation failed, timed out or panicked
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job state; terminal variants own their payload.
///
/// A result exists only on `Completed` and an error only on `Failed`, so a
/// record can never carry both or carry either while still processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobState {
    Processing,
    Completed { result: serde_json::Value },
    Failed { error: String },
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Processing => JobStatus::Processing,
            JobState::Completed { .. } => JobStatus::Completed,
            JobState::Failed { .. } => JobStatus::Failed,
        }
    }
}

/// A tracked unit of background work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,
    /// Current state (status plus terminal payload)
    #[serde(flatten)]
    pub state: JobState,
    /// When the job was created
    pub created_at: DateTime<Utc>,
    /// When the job was last updated
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new job in `processing`.
    pub fn new(id: JobId) -> Self {
        let now = Utc::now();
        Self {
            id,
            state: JobState::Processing,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    pub fn result(&self) -> Option<&serde_json::Value> {
        match &self.state {
            JobState::Completed { result } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            JobState::Failed { error } => Some(error),
            _ => None,
        }
    }

    /// Move to `completed`. Returns the current status if the job is not processing.
    pub fn mark_completed(&mut self, result: serde_json::Value) -> Result<(), JobStatus> {
        self.transition(JobState::Completed { result })
    }

    /// Move to `failed`. Returns the current status if the job is not processing.
    pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<(), JobStatus> {
        self.transition(JobState::Failed {
            error: error.into(),
        })
    }

    fn transition(&mut self, next: JobState) -> Result<(), JobStatus> {
        if self.status() != JobStatus::Processing {
            return Err(self.status());
        }
        self.state = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Job statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobStats {
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

impl JobStats {
    pub fn total(&self) -> usize {
        self.processing + self.completed + self.failed
    }

    pub(crate) fn record(&mut self, status: JobStatus) {
        match status {
            JobStatus::Processing => self.processing += 1,
            JobStatus::Completed => self.completed += 1,
            JobStatus::Failed => self.failed += 1,
        }
    }
}
