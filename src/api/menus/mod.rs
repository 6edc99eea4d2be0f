//! Menu API Module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::ServerState;

/// Menu router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/menus", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/all", get(handler::list_all))
        .route("/parent", get(handler::list_parents))
        .route("/tree", get(handler::tree))
        .route("/bulk-delete", post(handler::bulk_delete))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .patch(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/children", get(handler::children_of))
}
