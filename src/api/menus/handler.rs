//! Menu API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use crate::api::{BulkDeleteRequest, BulkDeleteResponse};
use crate::db::models::{Menu, MenuCreate, MenuUpdate, MenuWithPermissions};
use crate::db::repository::menu;
use crate::navigation::{self, NavEntry};
use crate::server::ServerState;
use crate::utils::AppResult;

/// List all menus with their required permissions
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<MenuWithPermissions>>> {
    let menus = menu::find_all(state.pool()).await?;
    Ok(Json(menus))
}

/// Flat menu list in display order
pub async fn list_all(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<MenuWithPermissions>>> {
    let menus = menu::find_all_for_tree(state.pool()).await?;
    Ok(Json(menus))
}

/// Top-level menus, candidates for a `parent_id`
pub async fn list_parents(State(state): State<ServerState>) -> AppResult<Json<Vec<Menu>>> {
    let menus = menu::find_root_menus(state.pool()).await?;
    Ok(Json(menus))
}

/// Navigation tree resolved against the caller's permissions
pub async fn tree(
    State(state): State<ServerState>,
    current_user: crate::auth::CurrentUser,
) -> AppResult<Json<Vec<NavEntry>>> {
    let entries = navigation::resolve_navigation(state.pool(), current_user.id).await?;
    Ok(Json(entries))
}

/// Get menu by id, including required permissions
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MenuWithPermissions>> {
    let found = menu::find_with_permissions(state.pool(), id).await?;
    Ok(Json(found))
}

/// Direct children of a menu, in display order
pub async fn children_of(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Menu>>> {
    let children = menu::children_of(state.pool(), id).await?;
    Ok(Json(children))
}

/// Create a menu entry
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<MenuCreate>,
) -> AppResult<Json<MenuWithPermissions>> {
    payload.validate()?;
    tracing::info!(name = %payload.name, "Creating a new menu");
    let created = menu::create(state.pool(), payload).await?;
    Ok(Json(created))
}

/// Update a menu entry
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<MenuUpdate>,
) -> AppResult<Json<MenuWithPermissions>> {
    let updated = menu::update(state.pool(), id, payload).await?;
    Ok(Json(updated))
}

/// Delete a menu; children are detached, not removed
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<bool>> {
    menu::delete(state.pool(), id).await?;
    Ok(Json(true))
}

/// Delete several menus at once
pub async fn bulk_delete(
    State(state): State<ServerState>,
    Json(payload): Json<BulkDeleteRequest>,
) -> AppResult<Json<BulkDeleteResponse>> {
    let affected = menu::bulk_delete(state.pool(), &payload.ids).await?;
    Ok(Json(BulkDeleteResponse { affected }))
}
