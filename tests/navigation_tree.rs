//! End-to-end resolver scenarios against an in-memory database

use console_server::DbService;
use console_server::db::models::{MenuCreate, PermissionCreate, RoleCreate, UserCreate};
use console_server::db::repository::{RepoError, menu, permission, role, user};
use console_server::navigation::{NavEntry, resolve_navigation};
use serde_json::json;
use sqlx::SqlitePool;

async fn pool() -> SqlitePool {
    DbService::in_memory().await.unwrap().pool.clone()
}

async fn seed_permission(pool: &SqlitePool, name: &str) -> i64 {
    permission::create(
        pool,
        PermissionCreate {
            name: name.to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_user_with_role(
    pool: &SqlitePool,
    username: &str,
    role_name: &str,
    permission_ids: Vec<i64>,
) -> i64 {
    let role_id = role::create(
        pool,
        RoleCreate {
            name: role_name.to_string(),
            permission_ids,
        },
    )
    .await
    .unwrap()
    .role
    .id;
    user::create(
        pool,
        UserCreate {
            email: format!("{username}@example.com"),
            username: username.to_string(),
            password: None,
            role_ids: vec![role_id],
        },
    )
    .await
    .unwrap()
    .user
    .id
}

async fn seed_menu(
    pool: &SqlitePool,
    name: &str,
    path: Option<&str>,
    sort: i32,
    parent_id: Option<i64>,
    permission_ids: Vec<i64>,
) -> i64 {
    menu::create(
        pool,
        MenuCreate {
            name: name.to_string(),
            icon: "dot".to_string(),
            path: path.map(str::to_string),
            sort,
            parent_id,
            permission_ids,
        },
    )
    .await
    .unwrap()
    .menu
    .id
}

fn bucket_of(entries: &[NavEntry]) -> &[console_server::navigation::NavNode] {
    match &entries[0] {
        NavEntry::Bucket { group } => group,
        NavEntry::Category(_) => panic!("first entry must be the bucket"),
    }
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let pool = pool().await;
    let err = resolve_navigation(&pool, 999).await.unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[tokio::test]
async fn empty_catalog_yields_a_lone_empty_bucket() {
    let pool = pool().await;
    let uid = seed_user_with_role(&pool, "alice", "viewer", vec![]).await;

    let entries = resolve_navigation(&pool, uid).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert!(bucket_of(&entries).is_empty());
}

#[tokio::test]
async fn menus_without_required_permissions_stay_hidden() {
    let pool = pool().await;
    let read = seed_permission(&pool, "users.read").await;
    seed_menu(&pool, "Unguarded", Some("/open"), 1, None, vec![]).await;
    seed_menu(&pool, "Guarded", Some("/users"), 2, None, vec![read]).await;

    let uid = seed_user_with_role(&pool, "alice", "viewer", vec![read]).await;
    let entries = resolve_navigation(&pool, uid).await.unwrap();

    let bucket = bucket_of(&entries);
    assert_eq!(bucket.len(), 1);
    assert_eq!(bucket[0].title, "Guarded");
}

#[tokio::test]
async fn all_required_permissions_must_be_held() {
    let pool = pool().await;
    let read = seed_permission(&pool, "users.read").await;
    let write = seed_permission(&pool, "users.write").await;
    seed_menu(&pool, "Admin", Some("/admin"), 1, None, vec![read, write]).await;

    let uid = seed_user_with_role(&pool, "alice", "viewer", vec![read]).await;
    let entries = resolve_navigation(&pool, uid).await.unwrap();
    assert!(bucket_of(&entries).is_empty());

    let uid2 = seed_user_with_role(&pool, "bob", "admin", vec![read, write]).await;
    let entries = resolve_navigation(&pool, uid2).await.unwrap();
    assert_eq!(bucket_of(&entries).len(), 1);
}

#[tokio::test]
async fn super_admin_bypasses_permission_filtering() {
    let pool = pool().await;
    let read = seed_permission(&pool, "users.read").await;
    seed_menu(&pool, "Guarded", Some("/users"), 1, None, vec![read]).await;
    seed_menu(&pool, "Unguarded", Some("/open"), 2, None, vec![]).await;

    // no permissions at all, only the magic role name
    let uid = seed_user_with_role(&pool, "root", "super admin", vec![]).await;
    let entries = resolve_navigation(&pool, uid).await.unwrap();

    let bucket = bucket_of(&entries);
    assert_eq!(bucket.len(), 2);
    assert_eq!(bucket[0].title, "Guarded");
    assert_eq!(bucket[1].title, "Unguarded");
}

#[tokio::test]
async fn category_keeps_surviving_children_and_loses_its_path() {
    let pool = pool().await;
    let read = seed_permission(&pool, "users.read").await;
    let write = seed_permission(&pool, "users.write").await;

    let system = seed_menu(&pool, "System", Some("/system"), 1, None, vec![read]).await;
    seed_menu(&pool, "Users", Some("/system/users"), 2, Some(system), vec![read]).await;
    seed_menu(&pool, "Audit", Some("/system/audit"), 1, Some(system), vec![write]).await;

    let uid = seed_user_with_role(&pool, "alice", "viewer", vec![read]).await;
    let entries = resolve_navigation(&pool, uid).await.unwrap();

    assert!(bucket_of(&entries).is_empty());
    let NavEntry::Category(node) = &entries[1] else {
        panic!("expected a category entry");
    };
    assert_eq!(node.title, "System");
    assert_eq!(node.path, None);
    let kids = node.group.as_ref().unwrap();
    assert_eq!(kids.len(), 1);
    assert_eq!(kids[0].title, "Users");
}

#[tokio::test]
async fn parent_with_all_children_filtered_moves_to_the_bucket() {
    let pool = pool().await;
    let read = seed_permission(&pool, "users.read").await;
    let write = seed_permission(&pool, "users.write").await;

    let system = seed_menu(&pool, "System", Some("/system"), 1, None, vec![read]).await;
    seed_menu(&pool, "Audit", Some("/system/audit"), 1, Some(system), vec![write]).await;

    let uid = seed_user_with_role(&pool, "alice", "viewer", vec![read]).await;
    let entries = resolve_navigation(&pool, uid).await.unwrap();

    // the childless parent keeps its path and joins the bucket
    assert_eq!(entries.len(), 1);
    let bucket = bucket_of(&entries);
    assert_eq!(bucket.len(), 1);
    assert_eq!(bucket[0].title, "System");
    assert_eq!(bucket[0].path.as_deref(), Some("/system"));
}

#[tokio::test]
async fn surviving_child_of_hidden_parent_never_attaches() {
    let pool = pool().await;
    let read = seed_permission(&pool, "users.read").await;
    let write = seed_permission(&pool, "users.write").await;

    let system = seed_menu(&pool, "System", Some("/system"), 1, None, vec![write]).await;
    seed_menu(&pool, "Users", Some("/system/users"), 1, Some(system), vec![read]).await;

    let uid = seed_user_with_role(&pool, "alice", "viewer", vec![read]).await;
    let entries = resolve_navigation(&pool, uid).await.unwrap();

    // the visible child has no visible parent and no root slot of its own
    assert_eq!(entries.len(), 1);
    assert!(bucket_of(&entries).is_empty());
}

#[tokio::test]
async fn serialized_output_matches_the_console_contract() {
    let pool = pool().await;
    let read = seed_permission(&pool, "users.read").await;

    let dash = seed_menu(&pool, "Dashboard", Some("/dash"), 1, None, vec![read]).await;
    let system = seed_menu(&pool, "System", Some("/system"), 2, None, vec![read]).await;
    let users = seed_menu(&pool, "Users", Some("/system/users"), 1, Some(system), vec![read]).await;

    let uid = seed_user_with_role(&pool, "alice", "viewer", vec![read]).await;
    let entries = resolve_navigation(&pool, uid).await.unwrap();
    let value = serde_json::to_value(&entries).unwrap();

    // bucket items carry no "group" key; nested leaves carry an empty one;
    // the category loses its path
    assert_eq!(
        value,
        json!([
            {
                "group": [
                    { "id": dash, "title": "Dashboard", "icon": "dot", "path": "/dash", "sort": 1 }
                ]
            },
            {
                "id": system,
                "title": "System",
                "icon": "dot",
                "sort": 2,
                "group": [
                    { "id": users, "title": "Users", "icon": "dot", "path": "/system/users", "sort": 1, "group": [] }
                ]
            }
        ])
    );
}
