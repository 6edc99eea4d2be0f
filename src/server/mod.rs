//! HTTP server assembly

pub mod config;
pub mod state;

pub use config::Config;
pub use state::ServerState;

use axum::Router;
use axum::middleware;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::auth::require_auth;
use crate::utils::AppError;

/// HTTP server
pub struct Server {
    config: Config,
    state: ServerState,
}

impl Server {
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    /// Build the full application router
    pub fn router(state: ServerState) -> Router {
        api::router()
            .layer(middleware::from_fn_with_state(state.clone(), require_auth))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind and serve until the process is stopped
    pub async fn run(self) -> Result<(), AppError> {
        let router = Self::router(self.state);

        let addr = format!("0.0.0.0:{}", self.config.http_port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to bind {addr}: {e}")))?;

        tracing::info!("HTTP server listening on {addr}");
        axum::serve(listener, router)
            .await
            .map_err(|e| AppError::Internal(format!("Server error: {e}")))
    }
}
