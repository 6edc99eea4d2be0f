//! Authentication and Authorization Module
//!
//! Handles JWT token generation/validation and the auth middleware

mod extractor;
mod jwt;
mod middleware;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService, TokenPair};
pub use middleware::require_auth;
