// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use leadflow_broadcast::BroadcastHub;
use leadflow_core::{LeadflowError, StorageAdapter};
use leadflow_engine::TurnOrchestrator;

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Accepts the synchronous phase of each turn.
    pub orchestrator: Arc<TurnOrchestrator>,
    /// Read side for the admin lead listing.
    pub storage: Arc<dyn StorageAdapter + Send + Sync>,
    /// Fan-out hub that WebSocket subscribers attach to.
    pub hub: Arc<BroadcastHub>,
    /// Authentication configuration for the admin routes.
    pub auth: AuthConfig,
    /// Process start time for uptime reporting.
    pub start_time: std::time::Instant,
}

/// Gateway server configuration (mirrors GatewayConfig from leadflow-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the gateway router.
///
/// - `GET /health` -- public liveness
/// - `POST /v1/conversation` -- visitor-facing, open
/// - `GET /ws/{channel}` -- visitor-facing subscriber socket, open
/// - `GET /v1/leads` -- admin, bearer-authenticated when configured
pub fn build_router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/v1/conversation", post(handlers::post_conversation))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/v1/leads", get(handlers::get_leads))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state.clone());

    let ws_routes = Router::new()
        .route("/ws/{channel}", get(ws::ws_handler))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .merge(ws_routes)
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP/WebSocket server and serve until cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), LeadflowError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LeadflowError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| LeadflowError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
