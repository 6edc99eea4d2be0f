//! Shared server state

use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::db::DbService;
use crate::server::Config;
use crate::utils::AppError;

/// State shared by every handler: the connection pool and the JWT service
#[derive(Clone)]
pub struct ServerState {
    pub db: DbService,
    pub jwt: JwtService,
}

impl ServerState {
    /// Open the database, run migrations, and build the JWT service
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let db = DbService::new(&config.db_path).await?;
        let jwt = JwtService::with_config(config.jwt.clone());
        Ok(Self { db, jwt })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }
}
