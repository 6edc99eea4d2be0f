//! Permission API Module

mod handler;

use axum::{Router, routing::get};

use crate::server::ServerState;

/// Permission router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/permissions", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .patch(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/roles", get(handler::roles_of))
}
