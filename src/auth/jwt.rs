//! JWT Token Service
//!
//! Handles access/refresh token generation, validation, and parsing.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT Configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Access token secret (should be at least 32 bytes)
    pub secret: String,
    /// Refresh token secret, independent of the access secret
    pub refresh_secret: String,
    /// Access token lifetime in minutes
    pub access_expiration_minutes: i64,
    /// Refresh token lifetime in minutes
    pub refresh_expiration_minutes: i64,
    /// Token issuer
    pub issuer: String,
    /// Token audience
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            #[cfg(debug_assertions)]
            {
                tracing::warn!(
                    "JWT_SECRET not set! Using insecure default key. DO NOT USE IN PRODUCTION!"
                );
                "dev-secret-key-change-in-production-min-32-chars-long".to_string()
            }
            #[cfg(not(debug_assertions))]
            {
                panic!("FATAL: JWT_SECRET environment variable is not set!");
            }
        });
        let refresh_secret =
            std::env::var("JWT_REFRESH_SECRET").unwrap_or_else(|_| format!("{secret}-refresh"));

        Self {
            secret,
            refresh_secret,
            access_expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            refresh_expiration_minutes: std::env::var("JWT_REFRESH_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(7 * 24 * 60),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "console-server".to_string()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "console-clients".to_string()),
        }
    }
}

/// JWT Claims stored in the token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Username
    pub username: String,
    /// "access" or "refresh"
    pub token_type: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
}

/// JWT Errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),
}

/// Access/refresh token pair returned by login and refresh
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// JWT Token Service
#[derive(Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl JwtService {
    /// Create a new JWT service with default config
    pub fn new() -> Self {
        Self::with_config(JwtConfig::default())
    }

    /// Create a new JWT service with custom config
    pub fn with_config(config: JwtConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            config,
        }
    }

    /// Generate an access/refresh token pair for a user
    pub fn generate_token_pair(
        &self,
        user_id: i64,
        username: impl Into<String>,
    ) -> Result<TokenPair, JwtError> {
        let username = username.into();
        let access_token = self.generate(
            user_id,
            username.clone(),
            "access",
            self.config.access_expiration_minutes,
            &self.access_encoding,
        )?;
        let refresh_token = self.generate(
            user_id,
            username,
            "refresh",
            self.config.refresh_expiration_minutes,
            &self.refresh_encoding,
        )?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    fn generate(
        &self,
        user_id: i64,
        username: String,
        token_type: &str,
        expiration_minutes: i64,
        key: &EncodingKey,
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(expiration_minutes);

        let claims = Claims {
            sub: user_id.to_string(),
            username,
            token_type: token_type.to_string(),
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::default(), &claims, key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// Validate and decode an access token
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate(token, &self.access_decoding, "access")
    }

    /// Validate and decode a refresh token
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate(token, &self.refresh_decoding, "refresh")
    }

    fn validate(
        &self,
        token: &str,
        key: &DecodingKey,
        expected_type: &str,
    ) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        let token_data = decode::<Claims>(token, key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
            ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            _ => JwtError::InvalidToken(e.to_string()),
        })?;

        if token_data.claims.token_type != expected_type {
            return Err(JwtError::InvalidToken(format!(
                "Expected {expected_type} token"
            )));
        }
        Ok(token_data.claims)
    }

    /// Extract token from Authorization header
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}

impl Default for JwtService {
    fn default() -> Self {
        Self::new()
    }
}

/// Current user context extracted from JWT
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

impl TryFrom<Claims> for CurrentUser {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| JwtError::InvalidToken("Malformed subject claim".to_string()))?;
        Ok(Self {
            id,
            username: claims.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::with_config(JwtConfig {
            secret: "test-secret-key-that-is-long-enough-1234".to_string(),
            refresh_secret: "test-refresh-key-that-is-long-enough-12".to_string(),
            access_expiration_minutes: 30,
            refresh_expiration_minutes: 60,
            issuer: "console-server".to_string(),
            audience: "console-clients".to_string(),
        })
    }

    #[test]
    fn token_pair_round_trips() {
        let jwt = service();
        let pair = jwt.generate_token_pair(42, "alice").unwrap();

        let claims = jwt.validate_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.username, "alice");

        let claims = jwt.validate_refresh_token(&pair.refresh_token).unwrap();
        assert_eq!(claims.token_type, "refresh");
    }

    #[test]
    fn access_token_is_not_a_refresh_token() {
        let jwt = service();
        let pair = jwt.generate_token_pair(42, "alice").unwrap();
        assert!(jwt.validate_refresh_token(&pair.access_token).is_err());
        assert!(jwt.validate_access_token(&pair.refresh_token).is_err());
    }

    #[test]
    fn header_extraction() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
    }
}
