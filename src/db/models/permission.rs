//! Permission Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Permission entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create permission payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PermissionCreate {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
}

/// Update permission payload
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionUpdate {
    pub name: Option<String>,
}

/// Tagged permission reference: resolve by id or by name.
///
/// HTTP handlers decide which variant a path parameter means; everything
/// below that boundary dispatches on the tag instead of sniffing strings.
#[derive(Debug, Clone)]
pub enum PermissionRef {
    Id(i64),
    Name(String),
}

impl PermissionRef {
    /// A parameter that parses as an integer is an id, anything else a name
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(id) => PermissionRef::Id(id),
            Err(_) => PermissionRef::Name(raw.to_string()),
        }
    }
}
