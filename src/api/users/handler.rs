//! User API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use crate::api::{BulkDeleteRequest, BulkDeleteResponse};
use crate::db::models::{Role, User, UserCreate, UserUpdate, UserWithRoles};
use crate::db::repository::user;
use crate::server::ServerState;
use crate::utils::AppResult;

/// List all users with their roles
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<UserWithRoles>>> {
    let users = user::find_all(state.pool()).await?;
    Ok(Json(users))
}

/// Get user by id, including roles
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<UserWithRoles>> {
    let found = user::find_with_roles(state.pool(), id).await?;
    Ok(Json(found))
}

/// Create a new user, optionally assigning roles up-front
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<UserCreate>,
) -> AppResult<Json<UserWithRoles>> {
    payload.validate()?;
    tracing::info!(username = %payload.username, "Creating a new user");
    let created = user::create(state.pool(), payload).await?;
    Ok(Json(created))
}

/// Update a user's profile fields
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<User>> {
    payload.validate()?;
    let updated = user::update(state.pool(), id, payload).await?;
    Ok(Json(updated))
}

/// Delete a user
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<bool>> {
    user::delete(state.pool(), id).await?;
    Ok(Json(true))
}

/// Delete several users at once
pub async fn bulk_delete(
    State(state): State<ServerState>,
    Json(payload): Json<BulkDeleteRequest>,
) -> AppResult<Json<BulkDeleteResponse>> {
    let affected = user::bulk_delete(state.pool(), &payload.ids).await?;
    Ok(Json(BulkDeleteResponse { affected }))
}

/// List the roles assigned to a user
pub async fn roles_of(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Role>>> {
    let found = user::find_with_roles(state.pool(), id).await?;
    Ok(Json(found.roles))
}

/// Assign additional roles; fails if any is already held
pub async fn assign_roles(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<RoleIdsRequest>,
) -> AppResult<Json<UserWithRoles>> {
    let updated = user::assign_roles(state.pool(), id, &payload.role_ids).await?;
    Ok(Json(updated))
}

/// Remove roles; fails if any is not currently held
pub async fn remove_roles(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<RoleIdsRequest>,
) -> AppResult<Json<UserWithRoles>> {
    let updated = user::remove_roles(state.pool(), id, &payload.role_ids).await?;
    Ok(Json(updated))
}

/// Replace the user's role set wholesale
pub async fn sync_roles(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<RoleIdsRequest>,
) -> AppResult<Json<UserWithRoles>> {
    let updated = user::sync_roles(state.pool(), id, &payload.role_ids).await?;
    Ok(Json(updated))
}

#[derive(Debug, serde::Deserialize)]
pub struct RoleIdsRequest {
    pub role_ids: Vec<i64>,
}
