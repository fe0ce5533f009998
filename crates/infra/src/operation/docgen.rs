//! Documentation generation: agent call plus artifact persistence.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use docforge_core::{ExtractionRequest, JobId};

use super::{ExternalOperation, ExtractionAgent, OperationError};
use crate::artifacts::{artifact_name, ArtifactStore};

/// The production operation: ask the agent for a document, keep it as an
/// artifact, and hand the markdown back as the job result.
pub struct DocGeneration {
    agent: Arc<dyn ExtractionAgent>,
    artifacts: ArtifactStore,
}

impl DocGeneration {
    pub fn new(agent: Arc<dyn ExtractionAgent>, artifacts: ArtifactStore) -> Self {
        Self { agent, artifacts }
    }
}

#[async_trait]
impl ExternalOperation for DocGeneration {
    async fn run(
        &self,
        job_id: JobId,
        request: ExtractionRequest,
    ) -> Result<serde_json::Value, OperationError> {
        let markdown = self.agent.extract(&request).await?;

        let name = artifact_name(&request, job_id);
        self.artifacts.write(&name, &markdown).await?;
        info!(job_id = %job_id, artifact = %name, bytes = markdown.len(), "document generated");

        Ok(serde_json::Value::String(markdown))
    }
}
