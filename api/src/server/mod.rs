//! API server
//!
//! Router assembly and server startup. CORS is wide open because the
//! sketch editor front end is served from a different origin in
//! development.

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use sketchpilot_core::AppConfig;

use crate::handlers::{
    accept_pending, apply_reply, create_session, get_session, health_check, list_history,
    list_models, preview_entry, reject_pending, restore_entry, submit_turn, ApiState,
};

/// Main API server
pub struct ApiServer {
    state: Arc<ApiState>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: AppConfig) -> Self {
        Self {
            state: Arc::new(ApiState::new(config)),
        }
    }

    /// Build the router (separate from `start` so tests can drive it)
    pub fn router(&self) -> Router {
        Router::new()
            // Turn streaming
            .route("/api/turns", post(submit_turn))
            // Model listing
            .route("/api/models/:provider", get(list_models))
            // Review sessions
            .route("/api/sessions", post(create_session))
            .route("/api/sessions/:id", get(get_session))
            .route("/api/sessions/:id/reply", post(apply_reply))
            .route("/api/sessions/:id/accept", post(accept_pending))
            .route("/api/sessions/:id/reject", post(reject_pending))
            .route("/api/sessions/:id/history", get(list_history))
            .route(
                "/api/sessions/:id/history/:entry_id/preview",
                get(preview_entry),
            )
            .route(
                "/api/sessions/:id/history/:entry_id/restore",
                post(restore_entry),
            )
            // Health check
            .route("/health", get(health_check))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Start the API server
    pub async fn start(&self) -> Result<()> {
        let host = self.state.config.server.host.clone();
        let port = self.state.config.server.port;
        info!("Starting Sketchpilot API server on {}:{}", host, port);

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Sketchpilot API server listening on {}", addr);

        axum::serve(listener, self.router())
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}
