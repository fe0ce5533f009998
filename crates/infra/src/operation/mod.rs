//! Boundary toward the external long-running operation.
//!
//! The coordinator only sees [`ExternalOperation`]: it hands over a validated
//! request and receives an opaque JSON payload or an error it can display.
//! In production the operation is [`DocGeneration`], which asks a remote
//! agent for a markdown document and keeps it as an artifact.

pub mod agent;
pub mod docgen;

use async_trait::async_trait;
use thiserror::Error;

use docforge_core::{ExtractionRequest, JobId};

use crate::artifacts::ArtifactError;

pub use agent::{ExtractionAgent, HttpAgent, HttpAgentConfig, UnconfiguredAgent};
pub use docgen::DocGeneration;

/// A long-running operation launched in the background for one job.
///
/// Implementations must not touch the job store; the coordinator records the
/// outcome.
#[async_trait]
pub trait ExternalOperation: Send + Sync + 'static {
    async fn run(
        &self,
        job_id: JobId,
        request: ExtractionRequest,
    ) -> Result<serde_json::Value, OperationError>;
}

/// Failure of the external operation; stored on the job as its `Display` text.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("agent endpoint not configured")]
    NotConfigured,

    #[error("agent request failed: {0}")]
    Transport(String),

    #[error("agent returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("invalid agent response: {0}")]
    InvalidResponse(String),

    #[error("operation timed out after {0:?}")]
    TimedOut(std::time::Duration),

    #[error("failed to store artifact: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("{0}")]
    Other(String),
}

impl OperationError {
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

impl From<reqwest::Error> for OperationError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
