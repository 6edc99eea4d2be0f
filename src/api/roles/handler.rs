//! Role API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use crate::api::{BulkDeleteRequest, BulkDeleteResponse};
use crate::db::models::{Permission, PermissionRef, RoleCreate, RoleUpdate, RoleWithPermissions};
use crate::db::repository::role;
use crate::server::ServerState;
use crate::utils::AppResult;

/// List all roles with their permissions
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<RoleWithPermissions>>> {
    let roles = role::find_all(state.pool()).await?;
    Ok(Json(roles))
}

/// Get role by id, including its permissions
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<RoleWithPermissions>> {
    let found = role::find_with_permissions(state.pool(), id).await?;
    Ok(Json(found))
}

/// Create a new role, optionally granting permissions up-front
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<RoleCreate>,
) -> AppResult<Json<RoleWithPermissions>> {
    payload.validate()?;
    tracing::info!(name = %payload.name, "Creating a new role");
    let created = role::create(state.pool(), payload).await?;
    Ok(Json(created))
}

/// Update a role; a `permission_ids` field replaces the whole grant set
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<RoleUpdate>,
) -> AppResult<Json<RoleWithPermissions>> {
    let updated = role::update(state.pool(), id, payload).await?;
    Ok(Json(updated))
}

/// Delete a role
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<bool>> {
    role::delete(state.pool(), id).await?;
    Ok(Json(true))
}

/// Delete several roles at once
pub async fn bulk_delete(
    State(state): State<ServerState>,
    Json(payload): Json<BulkDeleteRequest>,
) -> AppResult<Json<BulkDeleteResponse>> {
    let affected = role::bulk_delete(state.pool(), &payload.ids).await?;
    Ok(Json(BulkDeleteResponse { affected }))
}

/// List the permissions granted to a role
pub async fn permissions_of(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Permission>>> {
    let permissions = role::permissions_of(state.pool(), id).await?;
    Ok(Json(permissions))
}

/// Grant a permission, addressed by numeric id or by name
pub async fn grant_permission(
    State(state): State<ServerState>,
    Path((id, reference)): Path<(i64, String)>,
) -> AppResult<Json<RoleWithPermissions>> {
    let reference = PermissionRef::parse(&reference);
    let updated = role::grant(state.pool(), id, &reference).await?;
    Ok(Json(updated))
}

/// Revoke a single permission from a role
pub async fn detach_permission(
    State(state): State<ServerState>,
    Path((id, permission_id)): Path<(i64, i64)>,
) -> AppResult<Json<bool>> {
    role::detach_permission(state.pool(), id, permission_id).await?;
    Ok(Json(true))
}

/// Replace the role's grant set wholesale
pub async fn sync_permissions(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<SyncPermissionsRequest>,
) -> AppResult<Json<RoleWithPermissions>> {
    let updated = role::sync_permissions(state.pool(), id, &payload.permission_ids).await?;
    Ok(Json(updated))
}

#[derive(Debug, serde::Deserialize)]
pub struct SyncPermissionsRequest {
    pub permission_ids: Vec<i64>,
}
