//! Menu Repository

use chrono::Utc;
use sqlx::SqlitePool;

use super::{RepoError, RepoResult, dedup_ids, permission};
use crate::db::models::{Menu, MenuCreate, MenuUpdate, MenuWithPermissions, Permission};

const MENU_COLUMNS: &str = "id, name, icon, path, sort, parent_id, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Menu> {
    let menu = sqlx::query_as::<_, Menu>(&format!("SELECT {MENU_COLUMNS} FROM menu WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    menu.ok_or_else(|| RepoError::NotFound(format!("Menu with id {id} not found")))
}

pub async fn exists_by_name(pool: &SqlitePool, name: &str) -> RepoResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM menu WHERE name = ?)")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

pub async fn find_with_permissions(pool: &SqlitePool, id: i64) -> RepoResult<MenuWithPermissions> {
    let menu = find_by_id(pool, id).await?;
    let permissions = permissions_of(pool, id).await?;
    Ok(MenuWithPermissions { menu, permissions })
}

/// All menus with their permission sets, permissions ascending by id within
/// each menu
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<MenuWithPermissions>> {
    let menus =
        sqlx::query_as::<_, Menu>(&format!("SELECT {MENU_COLUMNS} FROM menu ORDER BY id"))
            .fetch_all(pool)
            .await?;
    with_permissions(pool, menus).await
}

/// All menus ordered by `sort`, the resolver's input
pub async fn find_all_for_tree(pool: &SqlitePool) -> RepoResult<Vec<MenuWithPermissions>> {
    let menus = sqlx::query_as::<_, Menu>(&format!(
        "SELECT {MENU_COLUMNS} FROM menu ORDER BY sort, id"
    ))
    .fetch_all(pool)
    .await?;
    with_permissions(pool, menus).await
}

/// Menus with no parent
pub async fn find_root_menus(pool: &SqlitePool) -> RepoResult<Vec<Menu>> {
    let menus = sqlx::query_as::<_, Menu>(&format!(
        "SELECT {MENU_COLUMNS} FROM menu WHERE parent_id IS NULL ORDER BY sort, id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(menus)
}

/// Direct children of a menu, ordered by sort
pub async fn children_of(pool: &SqlitePool, parent_id: i64) -> RepoResult<Vec<Menu>> {
    let menus = sqlx::query_as::<_, Menu>(&format!(
        "SELECT {MENU_COLUMNS} FROM menu WHERE parent_id = ? ORDER BY sort, id"
    ))
    .bind(parent_id)
    .fetch_all(pool)
    .await?;
    Ok(menus)
}

async fn permissions_of(pool: &SqlitePool, menu_id: i64) -> RepoResult<Vec<Permission>> {
    let permissions = sqlx::query_as::<_, Permission>(
        "SELECT p.id, p.name, p.created_at, p.updated_at FROM permission p \
         JOIN menu_has_permissions mp ON mp.permission_id = p.id \
         WHERE mp.menu_id = ? ORDER BY p.id",
    )
    .bind(menu_id)
    .fetch_all(pool)
    .await?;
    Ok(permissions)
}

async fn with_permissions(
    pool: &SqlitePool,
    menus: Vec<Menu>,
) -> RepoResult<Vec<MenuWithPermissions>> {
    let mut result = Vec::with_capacity(menus.len());
    for menu in menus {
        let permissions = permissions_of(pool, menu.id).await?;
        result.push(MenuWithPermissions { menu, permissions });
    }
    Ok(result)
}

pub async fn create(pool: &SqlitePool, data: MenuCreate) -> RepoResult<MenuWithPermissions> {
    if exists_by_name(pool, &data.name).await? {
        return Err(RepoError::Duplicate(format!(
            "Menu '{}' already exists",
            data.name
        )));
    }

    // A child menu must be navigable
    if data.parent_id.is_some() && data.path.is_none() {
        return Err(RepoError::Validation(
            "A menu with a parent requires a path".to_string(),
        ));
    }

    if let Some(parent_id) = data.parent_id {
        find_by_id(pool, parent_id).await?;
    }

    let permissions = if data.permission_ids.is_empty() {
        Vec::new()
    } else {
        permission::find_by_ids(pool, &data.permission_ids).await?
    };

    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let menu = sqlx::query_as::<_, Menu>(&format!(
        "INSERT INTO menu (name, icon, path, sort, parent_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {MENU_COLUMNS}"
    ))
    .bind(&data.name)
    .bind(&data.icon)
    .bind(&data.path)
    .bind(data.sort)
    .bind(data.parent_id)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    for p in &permissions {
        sqlx::query("INSERT INTO menu_has_permissions (menu_id, permission_id) VALUES (?, ?)")
            .bind(menu.id)
            .bind(p.id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(MenuWithPermissions { menu, permissions })
}

pub async fn update(pool: &SqlitePool, id: i64, data: MenuUpdate) -> RepoResult<MenuWithPermissions> {
    let existing = find_by_id(pool, id).await?;

    if let Some(ref new_name) = data.name
        && new_name != &existing.name
        && exists_by_name(pool, new_name).await?
    {
        return Err(RepoError::Duplicate(format!("Menu '{new_name}' already exists")));
    }

    if let Some(parent_id) = data.parent_id {
        find_by_id(pool, parent_id).await?;
        ensure_no_cycle(pool, id, parent_id).await?;
    }

    // The merged record must still satisfy the parent-implies-path rule
    let merged_parent = data.parent_id.or(existing.parent_id);
    let merged_path = data.path.clone().or(existing.path.clone());
    if merged_parent.is_some() && merged_path.is_none() {
        return Err(RepoError::Validation(
            "A menu with a parent requires a path".to_string(),
        ));
    }

    let new_permissions = match &data.permission_ids {
        Some(ids) if !ids.is_empty() => Some(permission::find_by_ids(pool, ids).await?),
        Some(_) => Some(Vec::new()),
        None => None,
    };

    let mut tx = pool.begin().await?;

    let menu = sqlx::query_as::<_, Menu>(&format!(
        "UPDATE menu SET name = COALESCE(?1, name), icon = COALESCE(?2, icon), \
         path = COALESCE(?3, path), sort = COALESCE(?4, sort), \
         parent_id = COALESCE(?5, parent_id), updated_at = ?6 WHERE id = ?7 \
         RETURNING {MENU_COLUMNS}"
    ))
    .bind(data.name)
    .bind(data.icon)
    .bind(data.path)
    .bind(data.sort)
    .bind(data.parent_id)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(ref permissions) = new_permissions {
        sqlx::query("DELETE FROM menu_has_permissions WHERE menu_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for p in permissions {
            sqlx::query("INSERT INTO menu_has_permissions (menu_id, permission_id) VALUES (?, ?)")
                .bind(id)
                .bind(p.id)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;

    let permissions = match new_permissions {
        Some(p) => p,
        None => permissions_of(pool, id).await?,
    };
    Ok(MenuWithPermissions { menu, permissions })
}

/// Walk the ancestor chain of the proposed parent; linking must not create
/// a cycle
async fn ensure_no_cycle(pool: &SqlitePool, id: i64, parent_id: i64) -> RepoResult<()> {
    let mut current = Some(parent_id);
    while let Some(ancestor) = current {
        if ancestor == id {
            return Err(RepoError::Validation(
                "Menu parent relation must not form a cycle".to_string(),
            ));
        }
        current = sqlx::query_scalar::<_, Option<i64>>("SELECT parent_id FROM menu WHERE id = ?")
            .bind(ancestor)
            .fetch_optional(pool)
            .await?
            .flatten();
    }
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let rows = sqlx::query("DELETE FROM menu WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Menu with id {id} not found")));
    }
    Ok(())
}

/// Delete a batch of menus, reporting how many were actually removed
pub async fn bulk_delete(pool: &SqlitePool, ids: &[i64]) -> RepoResult<u64> {
    let ids = dedup_ids(ids);
    if ids.is_empty() {
        return Err(RepoError::NotFound("Menus not found".to_string()));
    }

    let mut qb = sqlx::QueryBuilder::new("DELETE FROM menu WHERE id IN (");
    let mut separated = qb.separated(", ");
    for id in &ids {
        separated.push_bind(id);
    }
    qb.push(")");

    let affected = qb.build().execute(pool).await?.rows_affected();

    if affected == 0 {
        return Err(RepoError::NotFound("Menus not found".to_string()));
    }
    if affected != ids.len() as u64 {
        return Err(RepoError::PartialNotFound(format!(
            "Some menus not found ({affected} of {} deleted)",
            ids.len()
        )));
    }
    Ok(affected)
}
