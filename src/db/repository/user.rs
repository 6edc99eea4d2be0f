//! User Repository

use chrono::Utc;
use sqlx::SqlitePool;

use super::{RepoError, RepoResult, dedup_ids, role};
use crate::db::models::{
    Role, RoleWithPermissions, User, UserCreate, UserUpdate, UserWithRolePermissions,
    UserWithRoles,
};

const USER_COLUMNS: &str = "id, email, username, password, refresh_token, created_at, updated_at";

/// Default password applied when a create payload omits one
const DEFAULT_PASSWORD: &str = "12345678";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<UserWithRoles>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    let mut result = Vec::with_capacity(users.len());
    for user in users {
        let roles = roles_of_unchecked(pool, user.id).await?;
        result.push(UserWithRoles { user, roles });
    }
    Ok(result)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<User> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    user.ok_or_else(|| RepoError::NotFound("User not found".to_string()))
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> RepoResult<User> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ? LIMIT 1"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;
    user.ok_or_else(|| RepoError::NotFound("User not found".to_string()))
}

pub async fn exists_by_username(pool: &SqlitePool, username: &str) -> RepoResult<bool> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
            .bind(username)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

pub async fn exists_by_email(pool: &SqlitePool, email: &str) -> RepoResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
        .bind(email)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// User together with their roles
pub async fn find_with_roles(pool: &SqlitePool, id: i64) -> RepoResult<UserWithRoles> {
    let user = find_by_id(pool, id).await?;
    let roles = roles_of_unchecked(pool, id).await?;
    Ok(UserWithRoles { user, roles })
}

/// User with roles and each role's permission set, the resolver's input
pub async fn find_with_role_permissions(
    pool: &SqlitePool,
    id: i64,
) -> RepoResult<UserWithRolePermissions> {
    let user = find_by_id(pool, id).await?;
    let plain_roles = roles_of_unchecked(pool, id).await?;

    let mut roles = Vec::with_capacity(plain_roles.len());
    for r in plain_roles {
        let permissions = role::permissions_of(pool, r.id).await?;
        roles.push(RoleWithPermissions {
            role: r,
            permissions,
        });
    }
    Ok(UserWithRolePermissions { user, roles })
}

async fn roles_of_unchecked(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<Role>> {
    let roles = sqlx::query_as::<_, Role>(
        "SELECT r.id, r.name, r.created_at, r.updated_at FROM role r \
         JOIN entity_has_roles ur ON ur.role_id = r.id \
         WHERE ur.user_id = ? ORDER BY r.id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(roles)
}

/// Create a user.
///
/// Username uniqueness is checked first; email only once the username
/// passes. Role ids must all resolve before anything is persisted.
pub async fn create(pool: &SqlitePool, data: UserCreate) -> RepoResult<UserWithRoles> {
    if exists_by_username(pool, &data.username).await? {
        return Err(RepoError::Duplicate(format!(
            "Username '{}' already been taken",
            data.username
        )));
    }
    if exists_by_email(pool, &data.email).await? {
        return Err(RepoError::Duplicate(format!(
            "Email '{}' already been taken",
            data.email
        )));
    }

    let roles = if data.role_ids.is_empty() {
        Vec::new()
    } else {
        role::find_by_ids(pool, &data.role_ids).await?
    };

    let password = data.password.as_deref().unwrap_or(DEFAULT_PASSWORD);
    let hashed = User::hash_password(password)
        .map_err(|e| RepoError::Database(format!("Failed to hash password: {e}")))?;

    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (email, username, password, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?) RETURNING {USER_COLUMNS}"
    ))
    .bind(&data.email)
    .bind(&data.username)
    .bind(&hashed)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    for r in &roles {
        sqlx::query("INSERT INTO entity_has_roles (user_id, role_id) VALUES (?, ?)")
            .bind(user.id)
            .bind(r.id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(UserWithRoles { user, roles })
}

/// Partial update: absent fields keep their prior values
pub async fn update(pool: &SqlitePool, id: i64, data: UserUpdate) -> RepoResult<User> {
    let existing = find_by_id(pool, id).await?;

    if let Some(ref new_username) = data.username
        && new_username != &existing.username
        && exists_by_username(pool, new_username).await?
    {
        return Err(RepoError::Duplicate(format!(
            "Username '{new_username}' already been taken"
        )));
    }
    if let Some(ref new_email) = data.email
        && new_email != &existing.email
        && exists_by_email(pool, new_email).await?
    {
        return Err(RepoError::Duplicate(format!(
            "Email '{new_email}' already been taken"
        )));
    }

    let hashed = match data.password.as_deref() {
        Some(password) => Some(
            User::hash_password(password)
                .map_err(|e| RepoError::Database(format!("Failed to hash password: {e}")))?,
        ),
        None => None,
    };

    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET email = COALESCE(?1, email), username = COALESCE(?2, username), \
         password = COALESCE(?3, password), updated_at = ?4 WHERE id = ?5 \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(data.email)
    .bind(data.username)
    .bind(hashed)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(user)
}

/// Store (or clear) the hashed refresh token
pub async fn set_refresh_token(
    pool: &SqlitePool,
    id: i64,
    token_hash: Option<&str>,
) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE users SET refresh_token = ?, updated_at = ? WHERE id = ?")
        .bind(token_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound("User not found".to_string()));
    }
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let rows = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound("User not found".to_string()));
    }
    Ok(())
}

/// Delete a batch of users, reporting how many were actually removed
pub async fn bulk_delete(pool: &SqlitePool, ids: &[i64]) -> RepoResult<u64> {
    let ids = dedup_ids(ids);
    if ids.is_empty() {
        return Err(RepoError::NotFound("Users not found".to_string()));
    }

    let mut qb = sqlx::QueryBuilder::new("DELETE FROM users WHERE id IN (");
    let mut separated = qb.separated(", ");
    for id in &ids {
        separated.push_bind(id);
    }
    qb.push(")");

    let affected = qb.build().execute(pool).await?.rows_affected();

    if affected == 0 {
        return Err(RepoError::NotFound("Users not found".to_string()));
    }
    if affected != ids.len() as u64 {
        return Err(RepoError::PartialNotFound(format!(
            "Some users not found ({affected} of {} deleted)",
            ids.len()
        )));
    }
    Ok(affected)
}

/// Attach roles to a user; rejects when any requested role is already held
pub async fn assign_roles(
    pool: &SqlitePool,
    user_id: i64,
    role_ids: &[i64],
) -> RepoResult<UserWithRoles> {
    let user = find_by_id(pool, user_id).await?;
    let roles = role::find_by_ids(pool, role_ids).await?;

    let mut tx = pool.begin().await?;

    let held = held_role_ids(&mut tx, user_id, &roles).await?;
    if !held.is_empty() {
        return Err(RepoError::Duplicate(
            "User already has some of these roles".to_string(),
        ));
    }

    for r in &roles {
        sqlx::query("INSERT INTO entity_has_roles (user_id, role_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(r.id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    let roles = roles_of_unchecked(pool, user_id).await?;
    Ok(UserWithRoles { user, roles })
}

/// Detach roles from a user; rejects when any requested role is not held
pub async fn remove_roles(
    pool: &SqlitePool,
    user_id: i64,
    role_ids: &[i64],
) -> RepoResult<UserWithRoles> {
    let user = find_by_id(pool, user_id).await?;
    let roles = role::find_by_ids(pool, role_ids).await?;

    let mut tx = pool.begin().await?;

    let held = held_role_ids(&mut tx, user_id, &roles).await?;
    if held.len() != roles.len() {
        return Err(RepoError::NotFound(
            "User does not have some of these roles".to_string(),
        ));
    }

    for r in &roles {
        sqlx::query("DELETE FROM entity_has_roles WHERE user_id = ? AND role_id = ?")
            .bind(user_id)
            .bind(r.id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    let roles = roles_of_unchecked(pool, user_id).await?;
    Ok(UserWithRoles { user, roles })
}

/// Replace the whole role set atomically
pub async fn sync_roles(
    pool: &SqlitePool,
    user_id: i64,
    role_ids: &[i64],
) -> RepoResult<UserWithRoles> {
    let user = find_by_id(pool, user_id).await?;
    let roles = if role_ids.is_empty() {
        Vec::new()
    } else {
        role::find_by_ids(pool, role_ids).await?
    };

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM entity_has_roles WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    for r in &roles {
        sqlx::query("INSERT INTO entity_has_roles (user_id, role_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(r.id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    Ok(UserWithRoles { user, roles })
}

/// Which of the given roles the user already holds, read inside the caller's
/// transaction so the membership check and the writes cannot interleave with
/// a concurrent mutation
async fn held_role_ids(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    user_id: i64,
    roles: &[Role],
) -> RepoResult<Vec<i64>> {
    let mut qb = sqlx::QueryBuilder::new(
        "SELECT role_id FROM entity_has_roles WHERE user_id = ",
    );
    qb.push_bind(user_id);
    qb.push(" AND role_id IN (");
    let mut separated = qb.separated(", ");
    for r in roles {
        separated.push_bind(r.id);
    }
    qb.push(")");

    let held: Vec<i64> = qb.build_query_scalar().fetch_all(&mut **tx).await?;
    Ok(held)
}
