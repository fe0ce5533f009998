use std::sync::Arc;

use tracing::{info, warn};

use docforge_infra::artifacts::ArtifactStore;
use docforge_infra::jobs::retention::{self, RetentionHandle, RetentionPolicy};
use docforge_infra::jobs::{CoordinatorConfig, InMemoryJobStore, JobCoordinator};
use docforge_infra::operation::{
    DocGeneration, ExternalOperation, ExtractionAgent, HttpAgent, HttpAgentConfig, OperationError,
    UnconfiguredAgent,
};

use crate::config::ApiConfig;

/// Coordinator over the in-memory store.
pub type Coordinator = JobCoordinator<InMemoryJobStore>;

/// Everything the handlers need, shared behind an `Arc`.
pub struct AppServices {
    pub coordinator: Coordinator,
    pub artifacts: ArtifactStore,
}

/// Wire the production services: HTTP agent (if configured) + artifacts.
pub fn build_services(config: &ApiConfig) -> Result<AppServices, OperationError> {
    let artifacts = ArtifactStore::new(&config.output_dir);

    let agent: Arc<dyn ExtractionAgent> = match &config.agent_url {
        Some(url) => {
            let mut agent_cfg = HttpAgentConfig::new(url).with_timeout(config.agent_timeout);
            if let Some(key) = &config.agent_api_key {
                agent_cfg = agent_cfg.with_api_key(key);
            }
            info!(endpoint = %url, "using http extraction agent");
            Arc::new(HttpAgent::new(agent_cfg)?)
        }
        None => {
            warn!("DOCFORGE_AGENT_URL not set; submitted jobs will fail until it is configured");
            Arc::new(UnconfiguredAgent)
        }
    };

    let operation = Arc::new(DocGeneration::new(agent, artifacts.clone()));
    Ok(build_services_with(config, operation, artifacts))
}

/// Wire services around an arbitrary operation (used by tests and embedders).
pub fn build_services_with(
    config: &ApiConfig,
    operation: Arc<dyn ExternalOperation>,
    artifacts: ArtifactStore,
) -> AppServices {
    let coordinator_cfg = CoordinatorConfig::default()
        .with_timeout(config.job_timeout)
        .with_max_concurrent(config.max_concurrent_jobs);

    AppServices {
        coordinator: JobCoordinator::new(InMemoryJobStore::new(), operation, coordinator_cfg),
        artifacts,
    }
}

/// Start the retention sweeper when a TTL is configured.
///
/// The sweeper stops when the returned handle is dropped.
pub fn start_retention(services: &AppServices, config: &ApiConfig) -> Option<RetentionHandle> {
    let ttl = config.job_ttl?;
    let policy = RetentionPolicy::new(ttl).with_sweep_interval(config.sweep_interval);
    Some(retention::spawn_sweeper(
        services.coordinator.store().clone(),
        policy,
    ))
}
