use anyhow::Context;
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vodstream::config::settings::{AppConfig, ProcessingMode};
use vodstream::state::AppState;
use vodstream::{app, workers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting server...");

    let config = AppConfig::new();
    let state = AppState::from_config(config.clone());

    state
        .layout
        .ensure_roots()
        .await
        .context("Failed to create upload/output directories")?;
    info!(
        "Uploads in {}, streams in {}",
        config.upload_dir.display(),
        config.output_dir.display()
    );

    let workers = if config.processing_mode == ProcessingMode::Queued {
        workers::transcoder::spawn_transcoder_workers(&state, config.worker_count)
    } else {
        info!("Processing uploads synchronously");
        Vec::new()
    };
    let queue = state.queue.clone();

    let app = app::create_app(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Queued jobs are drained before exit.
    queue.close();
    for worker in workers {
        if let Err(e) = worker.await {
            error!("Transcoder worker ended abnormally: {}", e);
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
}
