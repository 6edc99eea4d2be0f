//! Menu Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Permission;

/// Menu entity: a node in the navigation hierarchy.
///
/// A menu with a parent is a navigable leaf and must carry a `path`; a menu
/// without a parent may be a category and omit it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Menu {
    pub id: i64,
    pub name: String,
    pub icon: String,
    pub path: Option<String>,
    pub sort: i32,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Menu together with its required permissions (ascending permission id)
#[derive(Debug, Clone, Serialize)]
pub struct MenuWithPermissions {
    #[serde(flatten)]
    pub menu: Menu,
    pub permissions: Vec<Permission>,
}

/// Create menu payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MenuCreate {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(length(max = 50))]
    pub icon: String,
    pub path: Option<String>,
    #[serde(default)]
    pub sort: i32,
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub permission_ids: Vec<i64>,
}

/// Update menu payload
///
/// `permission_ids`, when present, replaces the whole required set.
#[derive(Debug, Clone, Deserialize)]
pub struct MenuUpdate {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub path: Option<String>,
    pub sort: Option<i32>,
    pub parent_id: Option<i64>,
    pub permission_ids: Option<Vec<i64>>,
}
