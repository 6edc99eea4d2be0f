//! Permission API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use crate::db::models::{Permission, PermissionCreate, PermissionUpdate, Role};
use crate::db::repository::permission;
use crate::server::ServerState;
use crate::utils::AppResult;

/// List all permissions
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Permission>>> {
    let permissions = permission::find_all(state.pool()).await?;
    Ok(Json(permissions))
}

/// Get permission by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Permission>> {
    let found = permission::find_by_id(state.pool(), id).await?;
    Ok(Json(found))
}

/// Create a new permission
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<PermissionCreate>,
) -> AppResult<Json<Permission>> {
    payload.validate()?;
    tracing::info!(name = %payload.name, "Creating a new permission");
    let created = permission::create(state.pool(), payload).await?;
    Ok(Json(created))
}

/// Update a permission
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<PermissionUpdate>,
) -> AppResult<Json<Permission>> {
    let updated = permission::update(state.pool(), id, payload).await?;
    Ok(Json(updated))
}

/// Delete a permission
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<bool>> {
    permission::delete(state.pool(), id).await?;
    Ok(Json(true))
}

/// List the roles granting this permission
pub async fn roles_of(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Role>>> {
    let roles = permission::roles_of(state.pool(), id).await?;
    Ok(Json(roles))
}
