//! Role Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Permission;

/// Role entity (case-sensitive unique name)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role together with its granted permissions
#[derive(Debug, Clone, Serialize)]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
}

/// Create role payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RoleCreate {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[serde(default)]
    pub permission_ids: Vec<i64>,
}

/// Update role payload
///
/// `permission_ids`, when present, replaces the whole permission set.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub permission_ids: Option<Vec<i64>>,
}
