mod cache;
mod config;
mod connectors;
mod db;
mod error;
mod models;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use tokio::signal;

use crate::config::AppConfig;
use crate::connectors::Connector;
use crate::services::scheduler::ScheduleRegistry;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        source = %config.source.as_str(),
        port = config.port,
        dry_run = config.dry_run,
        "Starting backup scheduler"
    );

    // Ensure working directories exist
    std::fs::create_dir_all(&config.cache_dir)?;
    std::fs::create_dir_all(&config.data_dir)?;

    let pool = db::connection::create_pool(&config.db).await?;

    let connector = Connector::new(&config, pool.clone())?;
    if let Some(replicator) = connector.replicator() {
        replicator.init().await?;
        tracing::info!("Remote replication target ready");
    }

    let state = Arc::new(AppState::new(config.clone(), connector));

    // Register and start the cron timers; an invalid expression aborts here
    let registry = ScheduleRegistry::new(state.clone()).await?;
    registry.init_schedules().await?;
    registry.start().await?;

    // Status endpoint
    let app = routes::create_router(state.clone());
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Status endpoint listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop timers; an in-flight run finishes or fails on its own
    tracing::info!("Shutting down...");
    registry.shutdown().await?;
    wait_for_running_backups(&state, 30_000).await;
    pool.close().await;
    tracing::info!("Scheduler stopped");

    Ok(())
}

async fn wait_for_running_backups(state: &AppState, timeout_ms: u64) {
    let start = std::time::Instant::now();
    while start.elapsed().as_millis() < timeout_ms as u128 {
        if state.running.lock().await.is_empty() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }
    tracing::warn!("Backup run still in progress after shutdown timeout, exiting anyway");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
