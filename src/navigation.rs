//! Authorization Resolver
//!
//! Collapses a user's effective permission set against the menu hierarchy
//! into the personalized navigation tree the console renders. Read-only:
//! both inputs are loaded fresh on every invocation, nothing is cached.
//!
//! The output has two shapes, a fixed external contract: one synthetic
//! `{group: [...]}` bucket of permission-cleared standalone items first,
//! then the surviving category nodes in sort order.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::models::MenuWithPermissions;
use crate::db::repository::{RepoResult, menu, user};

/// A shaped navigation node.
///
/// `path` is present only on navigable leaves; `group` is omitted entirely
/// on items moved into the root bucket and is an empty list on childless
/// nested nodes.
#[derive(Debug, Clone, Serialize)]
pub struct NavNode {
    pub id: i64,
    pub title: String,
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub sort: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<Vec<NavNode>>,
}

/// One entry of the resolved navigation sequence
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum NavEntry {
    /// Synthetic container for root items that ended up childless
    Bucket { group: Vec<NavNode> },
    /// A root category with surviving children
    Category(NavNode),
}

/// Resolve the navigation tree a user may see.
///
/// Fails `NotFound` when the user id does not resolve. A role literally
/// named `"super admin"` bypasses all permission filtering.
pub async fn resolve_navigation(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<NavEntry>> {
    let user = user::find_with_role_permissions(pool, user_id).await?;
    let menus = menu::find_all_for_tree(pool).await?;

    let visible: Vec<&MenuWithPermissions> = if user.is_super_admin() {
        menus.iter().collect()
    } else {
        let granted = user.effective_permission_ids();
        menus.iter().filter(|m| has_permission(m, &granted)).collect()
    };

    Ok(build_tree(&visible))
}

/// A menu is visible iff it requires at least one permission and the user
/// holds every one of them. A menu with no required permissions is
/// inaccessible by default, not public.
fn has_permission(menu: &MenuWithPermissions, granted: &BTreeSet<i64>) -> bool {
    !menu.permissions.is_empty() && menu.permissions.iter().all(|p| granted.contains(&p.id))
}

/// Shape the filtered flat list into the two-shape output sequence.
///
/// Visibility was decided per menu against its own permissions, so a
/// surviving child of a filtered-out parent simply never attaches anywhere:
/// only root menus seed the walk.
fn build_tree(visible: &[&MenuWithPermissions]) -> Vec<NavEntry> {
    let mut children: HashMap<i64, Vec<&MenuWithPermissions>> = HashMap::new();
    for m in visible {
        if let Some(parent_id) = m.menu.parent_id {
            children.entry(parent_id).or_default().push(m);
        }
    }

    let mut bucket = Vec::new();
    let mut categories = Vec::new();

    for m in visible.iter().filter(|m| m.menu.parent_id.is_none()) {
        let node = build_node(m, &children);
        if node.group.as_ref().is_some_and(|g| !g.is_empty()) {
            categories.push(NavEntry::Category(node));
        } else {
            // Childless roots move into the bucket with the group key dropped
            bucket.push(NavNode { group: None, ..node });
        }
    }

    let mut entries = vec![NavEntry::Bucket { group: bucket }];
    entries.extend(categories);
    entries
}

fn build_node(
    menu: &MenuWithPermissions,
    children: &HashMap<i64, Vec<&MenuWithPermissions>>,
) -> NavNode {
    let mut kids: Vec<NavNode> = children
        .get(&menu.menu.id)
        .map(|list| list.iter().map(|c| build_node(c, children)).collect())
        .unwrap_or_default();
    kids.sort_by_key(|n| n.sort);

    if kids.is_empty() {
        NavNode {
            id: menu.menu.id,
            title: menu.menu.name.clone(),
            icon: menu.menu.icon.clone(),
            path: menu.menu.path.clone(),
            sort: menu.menu.sort,
            group: Some(Vec::new()),
        }
    } else {
        // A parent node is a navigational category, not a clickable leaf
        NavNode {
            id: menu.menu.id,
            title: menu.menu.name.clone(),
            icon: menu.menu.icon.clone(),
            path: None,
            sort: menu.menu.sort,
            group: Some(kids),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::db::models::{Menu, Permission};

    fn perm(id: i64) -> Permission {
        let now = Utc::now();
        Permission {
            id,
            name: format!("perm-{id}"),
            created_at: now,
            updated_at: now,
        }
    }

    fn menu_entry(
        id: i64,
        name: &str,
        sort: i32,
        parent_id: Option<i64>,
        permission_ids: &[i64],
    ) -> MenuWithPermissions {
        let now = Utc::now();
        MenuWithPermissions {
            menu: Menu {
                id,
                name: name.to_string(),
                icon: "icon".to_string(),
                path: Some(format!("/{name}")),
                sort,
                parent_id,
                created_at: now,
                updated_at: now,
            },
            permissions: permission_ids.iter().map(|&p| perm(p)).collect(),
        }
    }

    #[test]
    fn menu_without_permissions_is_never_visible() {
        let m = menu_entry(1, "dashboard", 0, None, &[]);
        let granted = BTreeSet::from([1, 2, 3]);
        assert!(!has_permission(&m, &granted));
    }

    #[test]
    fn menu_requires_every_permission() {
        let m = menu_entry(1, "reports", 0, None, &[1, 2]);
        assert!(has_permission(&m, &BTreeSet::from([1, 2, 3])));
        assert!(!has_permission(&m, &BTreeSet::from([1])));
    }

    #[test]
    fn childless_roots_collapse_into_leading_bucket() {
        let a = menu_entry(1, "home", 0, None, &[1]);
        let b = menu_entry(2, "about", 1, None, &[1]);
        let entries = build_tree(&[&a, &b]);

        assert_eq!(entries.len(), 1);
        match &entries[0] {
            NavEntry::Bucket { group } => {
                assert_eq!(group.len(), 2);
                assert_eq!(group[0].id, 1);
                assert_eq!(group[1].id, 2);
                // Bucket items drop the group key and keep their path
                assert!(group[0].group.is_none());
                assert_eq!(group[0].path.as_deref(), Some("/home"));
            }
            NavEntry::Category(_) => panic!("expected the synthetic bucket first"),
        }
    }

    #[test]
    fn category_loses_path_and_keeps_sorted_children() {
        let root = menu_entry(1, "admin", 5, None, &[1]);
        let second = menu_entry(2, "users", 2, Some(1), &[1]);
        let first = menu_entry(3, "roles", 1, Some(1), &[1]);
        let entries = build_tree(&[&root, &second, &first]);

        assert_eq!(entries.len(), 2);
        match &entries[1] {
            NavEntry::Category(node) => {
                assert_eq!(node.id, 1);
                assert!(node.path.is_none());
                let group = node.group.as_ref().unwrap();
                assert_eq!(group[0].id, 3);
                assert_eq!(group[1].id, 2);
                // Nested leaves keep an (empty) group and their path
                assert!(group[0].group.as_ref().unwrap().is_empty());
                assert_eq!(group[0].path.as_deref(), Some("/roles"));
            }
            NavEntry::Bucket { .. } => panic!("expected a category node"),
        }
    }

    #[test]
    fn visible_child_of_invisible_parent_never_attaches() {
        // Parent filtered out upstream: only the child reaches build_tree
        let child = menu_entry(2, "orphan", 0, Some(1), &[1]);
        let entries = build_tree(&[&child]);

        assert_eq!(entries.len(), 1);
        match &entries[0] {
            NavEntry::Bucket { group } => assert!(group.is_empty()),
            NavEntry::Category(_) => panic!("expected only the empty bucket"),
        }
    }

    #[test]
    fn serialized_shape_matches_contract() {
        let root = menu_entry(1, "admin", 1, None, &[1]);
        let child = menu_entry(2, "users", 0, Some(1), &[1]);
        let lone = menu_entry(3, "home", 0, None, &[1]);
        let entries = build_tree(&[&lone, &root, &child]);

        let value = serde_json::to_value(&entries).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {
                    "group": [
                        {"id": 3, "title": "home", "icon": "icon", "path": "/home", "sort": 0}
                    ]
                },
                {
                    "id": 1,
                    "title": "admin",
                    "icon": "icon",
                    "sort": 1,
                    "group": [
                        {"id": 2, "title": "users", "icon": "icon", "path": "/users", "sort": 0, "group": []}
                    ]
                }
            ])
        );
    }
}
