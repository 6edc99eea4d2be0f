//! User API Module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::ServerState;

/// User router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/users", routes())
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
            "/{id}/roles",
            get(handler::roles_of)
                .post(handler::assign_roles)
                .put(handler::sync_roles)
                .delete(handler::remove_roles),
        )
}
