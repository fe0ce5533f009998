use std::sync::Arc;

use anyhow::Context;

use docforge_api::app::{self, services};
use docforge_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    docforge_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    let services = Arc::new(
        services::build_services(&config).context("failed to build extraction agent")?,
    );
    let retention = services::start_retention(&services, &config);

    let router = app::build_app(services, &config);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        output_dir = %config.output_dir.display(),
        "listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(handle) = retention {
        handle.shutdown().await;
    }
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
