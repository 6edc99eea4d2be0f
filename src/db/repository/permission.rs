//! Permission Repository

use chrono::Utc;
use sqlx::SqlitePool;

use super::{RepoError, RepoResult, dedup_ids};
use crate::db::models::{Permission, PermissionCreate, PermissionRef, PermissionUpdate, Role};

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Permission>> {
    let permissions = sqlx::query_as::<_, Permission>(
        "SELECT id, name, created_at, updated_at FROM permission ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(permissions)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Permission> {
    let permission = sqlx::query_as::<_, Permission>(
        "SELECT id, name, created_at, updated_at FROM permission WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    permission.ok_or_else(|| RepoError::NotFound(format!("Permission with id {id} not found")))
}

pub async fn find_by_name(pool: &SqlitePool, name: &str) -> RepoResult<Permission> {
    let permission = sqlx::query_as::<_, Permission>(
        "SELECT id, name, created_at, updated_at FROM permission WHERE name = ? LIMIT 1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;
    permission.ok_or_else(|| RepoError::NotFound(format!("Permission with name {name} not found")))
}

pub async fn exists_by_name(pool: &SqlitePool, name: &str) -> RepoResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM permission WHERE name = ?)")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Resolve an id set to permissions.
///
/// Zero matches is `NotFound`; a partial match is the distinct
/// `PartialNotFound` ("some permissions not found") condition.
pub async fn find_by_ids(pool: &SqlitePool, ids: &[i64]) -> RepoResult<Vec<Permission>> {
    let ids = dedup_ids(ids);
    if ids.is_empty() {
        return Err(RepoError::NotFound("Permissions not found".to_string()));
    }

    let mut qb = sqlx::QueryBuilder::new(
        "SELECT id, name, created_at, updated_at FROM permission WHERE id IN (",
    );
    let mut separated = qb.separated(", ");
    for id in &ids {
        separated.push_bind(id);
    }
    qb.push(") ORDER BY id");

    let permissions: Vec<Permission> = qb.build_query_as().fetch_all(pool).await?;

    if permissions.is_empty() {
        return Err(RepoError::NotFound("Permissions not found".to_string()));
    }
    if permissions.len() != ids.len() {
        return Err(RepoError::PartialNotFound(
            "Some permissions not found".to_string(),
        ));
    }
    Ok(permissions)
}

/// Resolve a tagged reference via the matching lookup
pub async fn find_by_ref(pool: &SqlitePool, reference: &PermissionRef) -> RepoResult<Permission> {
    match reference {
        PermissionRef::Id(id) => find_by_id(pool, *id).await,
        PermissionRef::Name(name) => find_by_name(pool, name).await,
    }
}

pub async fn create(pool: &SqlitePool, data: PermissionCreate) -> RepoResult<Permission> {
    if exists_by_name(pool, &data.name).await? {
        return Err(RepoError::Duplicate(format!(
            "Permission '{}' already exists",
            data.name
        )));
    }

    let now = Utc::now();
    let permission = sqlx::query_as::<_, Permission>(
        "INSERT INTO permission (name, created_at, updated_at) VALUES (?, ?, ?) \
         RETURNING id, name, created_at, updated_at",
    )
    .bind(&data.name)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(permission)
}

pub async fn update(pool: &SqlitePool, id: i64, data: PermissionUpdate) -> RepoResult<Permission> {
    let existing = find_by_id(pool, id).await?;

    if let Some(ref new_name) = data.name
        && new_name != &existing.name
        && exists_by_name(pool, new_name).await?
    {
        return Err(RepoError::Duplicate(format!(
            "Permission '{new_name}' already exists"
        )));
    }

    let permission = sqlx::query_as::<_, Permission>(
        "UPDATE permission SET name = COALESCE(?1, name), updated_at = ?2 WHERE id = ?3 \
         RETURNING id, name, created_at, updated_at",
    )
    .bind(data.name)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(permission)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let rows = sqlx::query("DELETE FROM permission WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Permission with id {id} not found"
        )));
    }
    Ok(())
}

/// Roles that grant this permission
pub async fn roles_of(pool: &SqlitePool, permission_id: i64) -> RepoResult<Vec<Role>> {
    // Validate the permission exists so a bare id gets a proper 404
    find_by_id(pool, permission_id).await?;

    let roles = sqlx::query_as::<_, Role>(
        "SELECT r.id, r.name, r.created_at, r.updated_at FROM role r \
         JOIN role_has_permissions rp ON rp.role_id = r.id \
         WHERE rp.permission_id = ? ORDER BY r.id",
    )
    .bind(permission_id)
    .fetch_all(pool)
    .await?;
    Ok(roles)
}
