use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use imislab::config::AppConfig;
use imislab::state::AppState;
use imislab::views::spawn_view_sync;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let config = AppConfig::load().context("Failed to load config")?;
    let state = AppState::init(config)
        .await
        .context("Failed to initialize application state")?;

    let shutdown = CancellationToken::new();
    let view_sync = spawn_view_sync(state.views.clone(), shutdown.clone());

    info!(
        judge = %state.config.judge.base_url,
        max_concurrent_polls = state.config.judge.poll.max_concurrent,
        sync_interval_secs = state.config.views.sync_interval_secs,
        "imislab running"
    );

    shutdown_signal().await;
    info!("Shutting down");

    shutdown.cancel();
    state.pipeline.shutdown();
    if let Err(e) = view_sync.await {
        warn!(error = %e, "View sync task did not stop cleanly");
    }
    if let Err(e) = state.db.close().await {
        warn!(error = %e, "Failed to close database connection");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
