use std::sync::Arc;

use anyhow::Context;

use lineup_api::app::{self, services::AppServices};
use lineup_api::config::{self, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lineup_observability::init(config::log_format_from_env());
    let settings = Settings::from_env();

    let services = Arc::new(AppServices::in_memory(&settings));
    let router = app::build_app_with_services(services.clone());

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(services))
        .await
        .context("server terminated with an error")?;

    Ok(())
}

/// Wait for Ctrl-C, then close every live feed so open streams end.
async fn shutdown_signal(services: Arc<AppServices>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
    services.shutdown();
}
