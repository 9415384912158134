mod error;
mod routes;

use crate::media::MediaService;
use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MediaService>,
}

pub fn create_router(service: Arc<MediaService>) -> Router {
    Router::new()
        .route("/api/analyze/", post(routes::analyze))
        .route("/api/download/", get(routes::download))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service })
}

pub async fn run(service: Arc<MediaService>, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
