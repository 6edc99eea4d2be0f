//! Data models matching the RBAC schema

pub mod menu;
pub mod permission;
pub mod role;
pub mod user;

pub use menu::{Menu, MenuCreate, MenuUpdate, MenuWithPermissions};
pub use permission::{Permission, PermissionCreate, PermissionRef, PermissionUpdate};
pub use role::{Role, RoleCreate, RoleUpdate, RoleWithPermissions};
pub use user::{User, UserCreate, UserUpdate, UserWithRolePermissions, UserWithRoles};
