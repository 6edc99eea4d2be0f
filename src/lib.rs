//! Console Server - RBAC backend for the admin console
//!
//! Core pieces:
//!
//! - **Database** (`db`): SQLite storage, models and repositories for
//!   users, roles, permissions and menus
//! - **Navigation** (`navigation`): resolves the menu tree a user is
//!   allowed to see from their role-derived permissions
//! - **Auth** (`auth`): JWT + Argon2 authentication
//! - **HTTP API** (`api`): RESTful routes, one module per resource
//!
//! # Module structure
//!
//! ```text
//! src/
//! ├── server/        # config, state, router assembly
//! ├── auth/          # JWT service, middleware, extractor
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # pool, models, repositories, migrations
//! ├── navigation.rs  # permission-filtered menu tree
//! └── utils/         # errors, logging
//! ```

pub mod api;
pub mod auth;
pub mod db;
pub mod navigation;
pub mod server;
pub mod utils;

pub use auth::{CurrentUser, JwtService};
pub use db::DbService;
pub use navigation::{NavEntry, NavNode, resolve_navigation};
pub use server::{Config, Server, ServerState};
pub use utils::{AppError, AppResponse, AppResult};

pub use utils::logger::init_logger_with_file;

/// Load `.env` and install the logger.
///
/// Refuses to start a production deployment on the built-in JWT secret.
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    if config.is_production() && std::env::var("JWT_SECRET").is_err() {
        return Err("JWT_SECRET must be set when ENVIRONMENT=production".into());
    }

    Ok(())
}
