use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use findeasy_backend::app_state::{open_persistence, AppState};
use findeasy_backend::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let _guard = init_tracing(&config)?;

    let persistence = open_persistence(&config)
        .await
        .context("Failed to open storage backend")?;
    tracing::info!(backend = persistence.backend(), "storage ready");

    let addr = config.bind_addr;
    let state = AppState::new(config, persistence).await;
    let app = findeasy_backend::app(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server encountered an error")?;

    tracing::info!("Shutdown complete.");
    Ok(())
}

/// Logs to stdout, and additionally to a daily rolling file when `LOG_DIR` is set.
fn init_tracing(config: &Config) -> anyhow::Result<Option<WorkerGuard>> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_target(true);

    match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(dir, "findeasy.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            builder
                .with_writer(std::io::stdout.and(non_blocking))
                .init();
            Ok(Some(guard))
        }
        None => {
            builder.init();
            Ok(None)
        }
    }
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, shutting down..."),
        Err(e) => {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    }
}
