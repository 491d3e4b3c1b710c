//! HTTP API: Axum server exposing the round engine as JSON.
//!
//! Routes live under `/api/crash`. CORS is restricted to the configured
//! frontend origin (`"*"` allows any origin, without credentials).

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::future::Future;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::ServerConfig;
use routes::AppState;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState, server: &ServerConfig) -> Result<Router> {
    let cors = cors_layer(&server.cors_origin)?;

    Ok(Router::new()
        .route("/api/crash/start", post(routes::start_round))
        .route("/api/crash/cashout", post(routes::cash_out))
        .route("/api/crash/state", get(routes::get_state))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state))
}

fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if origin == "*" {
        return Ok(layer.allow_origin(Any));
    }
    let origin = origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {origin}"))?;
    Ok(layer.allow_origin(origin).allow_credentials(true))
}

/// Bind the configured port and serve until `shutdown` resolves.
pub async fn serve(
    state: AppState,
    server: &ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = build_router(state, server)?;
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], server.port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind port {}", server.port))?;
    info!(port = server.port, "Crash API listening on http://localhost:{}", server.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Crash API server error")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
