//! API route modules
//!
//! One module per resource, each exposing a `router()` nested under its
//! `/api/...` prefix:
//!
//! - [`auth`] - login, refresh, current user, logout
//! - [`users`] - user management and role assignment
//! - [`roles`] - role management and permission grants
//! - [`permissions`] - permission management
//! - [`menus`] - menu management and the resolved navigation tree
//! - [`health`] - liveness probe

pub mod auth;
pub mod health;
pub mod menus;
pub mod permissions;
pub mod roles;
pub mod users;

use axum::Router;

use crate::server::ServerState;

/// Compose every resource router
pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(users::router())
        .merge(roles::router())
        .merge(permissions::router())
        .merge(menus::router())
}

/// Body of bulk-delete requests
#[derive(Debug, serde::Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<i64>,
}

/// Response of bulk-delete requests: how many rows were actually removed
#[derive(Debug, serde::Serialize)]
pub struct BulkDeleteResponse {
    pub affected: u64,
}
