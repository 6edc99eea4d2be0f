//! Role API Module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::ServerState;

/// Role router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/roles", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/bulk-delete", post(handler::bulk_delete))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .patch(handler::update)
                .delete(handler::delete),
        )
        .route(
            "/{id}/permissions",
            get(handler::permissions_of).put(handler::sync_permissions),
        )
        .route(
            "/{id}/permissions/{reference}",
            post(handler::grant_permission).delete(handler::detach_permission),
        )
}
