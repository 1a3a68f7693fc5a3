//! HTTP server implementation using Axum.

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use capstan_core::config::GatewayConfig;
use capstan_orders::OrderProcessor;
use capstan_scheduler::CaptureScheduler;

/// Shared state for the gateway server.
pub struct AppState {
    pub gateway_config: GatewayConfig,
    /// The deferred-capture scheduler — serves the diagnostics view.
    pub scheduler: Arc<CaptureScheduler>,
    /// The order processor — webhook events are handed off to it.
    pub processor: Arc<OrderProcessor>,
    pub start_time: std::time::Instant,
}

/// Build the Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(super::routes::health_check))
        // Order webhook — acked immediately, processed off the request cycle
        .route("/webhooks/orders", post(super::routes::webhook_orders))
        // Scheduled-jobs API
        .route("/api/v1/jobs", get(super::routes::list_jobs))
        .route("/api/v1/jobs", post(super::routes::schedule_job))
        .route("/api/v1/jobs/{order_id}", delete(super::routes::cancel_job))
        .layer(
            CorsLayer::new()
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::DELETE,
                ])
                .allow_headers(Any)
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn start(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!(
        "{}:{}",
        state.gateway_config.host, state.gateway_config.port
    );
    let app = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 Capstan gateway listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
