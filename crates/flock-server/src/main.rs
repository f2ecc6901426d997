//! Flock Server — Application entry point.

use anyhow::Context;
use flock_db::DbManager;
use flock_server::api::{self, AppState};
use flock_server::config::ServerConfig;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("flock=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .json()
        .init();

    let config = ServerConfig::load().context("failed to load configuration")?;
    tracing::info!(bind = %config.http.bind, "Starting Flock server...");

    let db = DbManager::connect(&config.database)
        .await
        .context("failed to connect to SurrealDB")?;

    let state = AppState::new(db.client().clone(), config.scheduling.clone());
    let listener = TcpListener::bind(&config.http.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.http.bind))?;

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Flock server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
