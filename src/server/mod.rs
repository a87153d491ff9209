pub mod analyze;
pub mod billing;
pub mod rate_limit;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::social::SocialClient;
use billing::BillingClient;
use rate_limit::RateLimiter;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    pub social: Arc<SocialClient>,
    pub billing: Arc<BillingClient>,
}

pub fn router(state: AppState) -> Router {
    // The original handlers answered every request with permissive CORS headers.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/analyze", post(analyze::handle))
        .route("/api/checkout", post(billing::handle_checkout))
        .route("/api/webhook", post(billing::handle_webhook))
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "version": VERSION }))
}

pub async fn serve(config: &Config, state: AppState) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("Listening on http://{}", addr);

    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to install ctrl-c handler: {}", err);
        return;
    }
    log::info!("Shutdown signal received");
}
