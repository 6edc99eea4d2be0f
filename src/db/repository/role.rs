//! Role Repository

use chrono::Utc;
use sqlx::SqlitePool;

use super::{RepoError, RepoResult, dedup_ids, permission};
use crate::db::models::{
    Permission, PermissionRef, Role, RoleCreate, RoleUpdate, RoleWithPermissions,
};

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<RoleWithPermissions>> {
    let roles =
        sqlx::query_as::<_, Role>("SELECT id, name, created_at, updated_at FROM role ORDER BY id")
            .fetch_all(pool)
            .await?;

    let mut result = Vec::with_capacity(roles.len());
    for role in roles {
        let permissions = permissions_of_unchecked(pool, role.id).await?;
        result.push(RoleWithPermissions { role, permissions });
    }
    Ok(result)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Role> {
    let role =
        sqlx::query_as::<_, Role>("SELECT id, name, created_at, updated_at FROM role WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    role.ok_or_else(|| RepoError::NotFound(format!("Role with id {id} not found")))
}

pub async fn exists_by_name(pool: &SqlitePool, name: &str) -> RepoResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM role WHERE name = ?)")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Resolve an id set to roles, with the same zero/partial semantics as
/// [`permission::find_by_ids`]
pub async fn find_by_ids(pool: &SqlitePool, ids: &[i64]) -> RepoResult<Vec<Role>> {
    let ids = dedup_ids(ids);
    if ids.is_empty() {
        return Err(RepoError::NotFound("Roles not found".to_string()));
    }

    let mut qb =
        sqlx::QueryBuilder::new("SELECT id, name, created_at, updated_at FROM role WHERE id IN (");
    let mut separated = qb.separated(", ");
    for id in &ids {
        separated.push_bind(id);
    }
    qb.push(") ORDER BY id");

    let roles: Vec<Role> = qb.build_query_as().fetch_all(pool).await?;

    if roles.is_empty() {
        return Err(RepoError::NotFound("Roles not found".to_string()));
    }
    if roles.len() != ids.len() {
        return Err(RepoError::PartialNotFound("Some roles not found".to_string()));
    }
    Ok(roles)
}

pub async fn find_with_permissions(pool: &SqlitePool, id: i64) -> RepoResult<RoleWithPermissions> {
    let role = find_by_id(pool, id).await?;
    let permissions = permissions_of_unchecked(pool, id).await?;
    Ok(RoleWithPermissions { role, permissions })
}

/// Permissions granted to an existing role, ascending permission id
pub async fn permissions_of(pool: &SqlitePool, role_id: i64) -> RepoResult<Vec<Permission>> {
    find_by_id(pool, role_id).await?;
    permissions_of_unchecked(pool, role_id).await
}

async fn permissions_of_unchecked(pool: &SqlitePool, role_id: i64) -> RepoResult<Vec<Permission>> {
    let permissions = sqlx::query_as::<_, Permission>(
        "SELECT p.id, p.name, p.created_at, p.updated_at FROM permission p \
         JOIN role_has_permissions rp ON rp.permission_id = p.id \
         WHERE rp.role_id = ? ORDER BY p.id",
    )
    .bind(role_id)
    .fetch_all(pool)
    .await?;
    Ok(permissions)
}

pub async fn create(pool: &SqlitePool, data: RoleCreate) -> RepoResult<RoleWithPermissions> {
    if exists_by_name(pool, &data.name).await? {
        return Err(RepoError::Duplicate(format!(
            "Role '{}' already exists",
            data.name
        )));
    }

    let permissions = if data.permission_ids.is_empty() {
        Vec::new()
    } else {
        permission::find_by_ids(pool, &data.permission_ids).await?
    };

    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let role = sqlx::query_as::<_, Role>(
        "INSERT INTO role (name, created_at, updated_at) VALUES (?, ?, ?) \
         RETURNING id, name, created_at, updated_at",
    )
    .bind(&data.name)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    for p in &permissions {
        sqlx::query("INSERT INTO role_has_permissions (role_id, permission_id) VALUES (?, ?)")
            .bind(role.id)
            .bind(p.id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(RoleWithPermissions { role, permissions })
}

pub async fn update(pool: &SqlitePool, id: i64, data: RoleUpdate) -> RepoResult<RoleWithPermissions> {
    let existing = find_by_id(pool, id).await?;

    if let Some(ref new_name) = data.name
        && new_name != &existing.name
        && exists_by_name(pool, new_name).await?
    {
        return Err(RepoError::Duplicate(format!("Role '{new_name}' already exists")));
    }

    // Resolve outside the transaction, propagating NotFound/PartialNotFound
    let new_permissions = match &data.permission_ids {
        Some(ids) if !ids.is_empty() => Some(permission::find_by_ids(pool, ids).await?),
        Some(_) => Some(Vec::new()),
        None => None,
    };

    let mut tx = pool.begin().await?;

    let role = sqlx::query_as::<_, Role>(
        "UPDATE role SET name = COALESCE(?1, name), updated_at = ?2 WHERE id = ?3 \
         RETURNING id, name, created_at, updated_at",
    )
    .bind(data.name)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(ref permissions) = new_permissions {
        sqlx::query("DELETE FROM role_has_permissions WHERE role_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for p in permissions {
            sqlx::query("INSERT INTO role_has_permissions (role_id, permission_id) VALUES (?, ?)")
                .bind(id)
                .bind(p.id)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;

    let permissions = match new_permissions {
        Some(p) => p,
        None => permissions_of_unchecked(pool, id).await?,
    };
    Ok(RoleWithPermissions { role, permissions })
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let rows = sqlx::query("DELETE FROM role WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Role with id {id} not found")));
    }
    Ok(())
}

/// Delete a batch of roles, reporting how many were actually removed
pub async fn bulk_delete(pool: &SqlitePool, ids: &[i64]) -> RepoResult<u64> {
    let ids = dedup_ids(ids);
    if ids.is_empty() {
        return Err(RepoError::NotFound("Roles not found".to_string()));
    }

    let mut qb = sqlx::QueryBuilder::new("DELETE FROM role WHERE id IN (");
    let mut separated = qb.separated(", ");
    for id in &ids {
        separated.push_bind(id);
    }
    qb.push(")");

    let affected = qb.build().execute(pool).await?.rows_affected();

    if affected == 0 {
        return Err(RepoError::NotFound("Roles not found".to_string()));
    }
    if affected != ids.len() as u64 {
        return Err(RepoError::PartialNotFound(format!(
            "Some roles not found ({affected} of {} deleted)",
            ids.len()
        )));
    }
    Ok(affected)
}

/// Grant one permission to a role.
///
/// The link is a single conditional insert, so two concurrent attaches of
/// the same pair cannot both succeed.
pub async fn attach_permission(
    pool: &SqlitePool,
    role_id: i64,
    permission_id: i64,
) -> RepoResult<RoleWithPermissions> {
    find_by_id(pool, role_id).await?;
    let permission = permission::find_by_id(pool, permission_id).await?;

    let rows = sqlx::query(
        "INSERT OR IGNORE INTO role_has_permissions (role_id, permission_id) VALUES (?, ?)",
    )
    .bind(role_id)
    .bind(permission_id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::Duplicate(format!(
            "Role already has permission '{}'",
            permission.name
        )));
    }

    find_with_permissions(pool, role_id).await
}

/// Revoke one permission from a role; the unlink is a single conditional
/// delete
pub async fn detach_permission(
    pool: &SqlitePool,
    role_id: i64,
    permission_id: i64,
) -> RepoResult<()> {
    find_by_id(pool, role_id).await?;

    let rows =
        sqlx::query("DELETE FROM role_has_permissions WHERE role_id = ? AND permission_id = ?")
            .bind(role_id)
            .bind(permission_id)
            .execute(pool)
            .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Permission with id {permission_id} not found"
        )));
    }
    Ok(())
}

/// Replace the whole permission set atomically
pub async fn sync_permissions(
    pool: &SqlitePool,
    role_id: i64,
    permission_ids: &[i64],
) -> RepoResult<RoleWithPermissions> {
    let role = find_by_id(pool, role_id).await?;
    let permissions = if permission_ids.is_empty() {
        Vec::new()
    } else {
        permission::find_by_ids(pool, permission_ids).await?
    };

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM role_has_permissions WHERE role_id = ?")
        .bind(role_id)
        .execute(&mut *tx)
        .await?;
    for p in &permissions {
        sqlx::query("INSERT INTO role_has_permissions (role_id, permission_id) VALUES (?, ?)")
            .bind(role_id)
            .bind(p.id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    Ok(RoleWithPermissions { role, permissions })
}

/// Grant a permission referenced by id or by name
pub async fn grant(
    pool: &SqlitePool,
    role_id: i64,
    reference: &PermissionRef,
) -> RepoResult<RoleWithPermissions> {
    let permission = permission::find_by_ref(pool, reference).await?;
    attach_permission(pool, role_id, permission.id).await
}
