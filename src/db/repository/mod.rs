//! Repository Module
//!
//! Per-entity modules of free functions over the shared pool. Association
//! mutations are single conditional statements or transactions so a
//! check-then-act pair can never interleave with a concurrent writer.

pub mod menu;
pub mod permission;
pub mod role;
pub mod user;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// A requested id set resolved partially, distinct from total NotFound
    #[error("Partially not found: {0}")]
    PartialNotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Sort and deduplicate an id set so count comparisons are honest
pub(crate) fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}
