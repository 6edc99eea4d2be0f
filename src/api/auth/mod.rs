//! Auth API Module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::ServerState;

/// Auth router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/auth", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/login", post(handler::login))
        .route("/refresh", get(handler::refresh))
        .route("/user", get(handler::current_user))
        .route("/logout", get(handler::logout))
}
