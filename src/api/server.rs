use std::net::SocketAddr;

use axum::{Router, routing::get, routing::post};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::decompression::RequestDecompressionLayer;
use tracing::info;

use super::{
    services::{cancel_job, debug_search, download_archive, get_status, health, start_download},
    state::AppState,
};
use crate::config::Config;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/download", post(start_download))
        .route("/download/{job_id}", get(download_archive))
        .route("/status/{job_id}", get(get_status))
        .route("/cancel/{job_id}", post(cancel_job))
        .route("/debug-search", post(debug_search))
        .route("/health", get(health))
        .with_state(state)
        // gzip request bodies are decompressed before handlers see them
        .layer(RequestDecompressionLayer::new())
        .layer(CorsLayer::permissive())
}

pub async fn run(address: SocketAddr, config: Config) -> Result<(), AnyError> {
    info!(
        endpoint = %config.search.endpoint,
        max_count = config.server.max_count,
        "Building application state"
    );
    let state = AppState::from_config(config)?;
    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "imagebox API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
