//! User Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{Permission, Role, RoleWithPermissions};

/// Role name granting unfiltered navigation access
pub const SUPER_ADMIN_ROLE: &str = "super admin";

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Hash a password using argon2
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
        };

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
        Ok(password_hash.to_string())
    }

    /// Verify a password against the stored argon2 hash
    pub fn verify_password(&self, password: &str) -> bool {
        Self::verify_hash(&self.password, password)
    }

    /// Verify a plain value against an argon2 hash
    pub fn verify_hash(hash: &str, value: &str) -> bool {
        use argon2::{
            Argon2,
            password_hash::{PasswordHash, PasswordVerifier},
        };

        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(value.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// User together with their roles
#[derive(Debug, Clone, Serialize)]
pub struct UserWithRoles {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<Role>,
}

/// User with roles and each role's permissions, the resolver's input
#[derive(Debug, Clone, Serialize)]
pub struct UserWithRolePermissions {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<RoleWithPermissions>,
}

impl UserWithRolePermissions {
    /// Whether any held role is the super-admin sentinel
    pub fn is_super_admin(&self) -> bool {
        self.roles.iter().any(|r| r.role.name == SUPER_ADMIN_ROLE)
    }

    /// Effective permissions: deduplicated union across all roles.
    ///
    /// Recomputed per call, never cached on the entity. Direct user-level
    /// grants are deliberately excluded.
    pub fn effective_permissions(&self) -> Vec<&Permission> {
        let mut seen = std::collections::BTreeSet::new();
        let mut permissions = Vec::new();
        for role in &self.roles {
            for permission in &role.permissions {
                if seen.insert(permission.id) {
                    permissions.push(permission);
                }
            }
        }
        permissions
    }

    /// Effective permission ids as a set, for membership checks
    pub fn effective_permission_ids(&self) -> std::collections::BTreeSet<i64> {
        self.effective_permissions().iter().map(|p| p.id).collect()
    }
}

/// Create user payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserCreate {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 70))]
    pub username: String,
    /// Defaults to "12345678" when absent; hashed before persisting
    pub password: Option<String>,
    #[serde(default)]
    pub role_ids: Vec<i64>,
}

/// Update user payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserUpdate {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 70))]
    pub username: Option<String>,
    pub password: Option<String>,
}
