//! Auth API Handlers

use axum::{Json, extract::State, http::HeaderMap};
use serde::Deserialize;

use crate::auth::{CurrentUser, JwtService, TokenPair};
use crate::db::models::{User, UserWithRoles};
use crate::db::repository::{RepoError, user};
use crate::server::ServerState;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Verify credentials and issue a token pair
///
/// The argon2 hash of the refresh token is stored so a stolen database
/// cannot replay sessions. Failures report a uniform message.
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<TokenPair>> {
    let found = match user::find_by_username(state.pool(), &payload.username).await {
        Ok(found) => found,
        Err(RepoError::NotFound(_)) => return Err(AppError::invalid_credentials()),
        Err(err) => return Err(err.into()),
    };

    if !found.verify_password(&payload.password) {
        tracing::warn!(target: "security", username = %payload.username, "Failed login attempt");
        return Err(AppError::invalid_credentials());
    }

    let pair = issue_tokens(&state, &found).await?;
    tracing::info!(user_id = found.id, username = %found.username, "User logged in");
    Ok(Json(pair))
}

/// Rotate the token pair using a refresh token from the Authorization header
pub async fn refresh(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> AppResult<Json<TokenPair>> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    let token = JwtService::extract_from_header(header).ok_or(AppError::InvalidToken)?;

    let claims = state.jwt.validate_refresh_token(token)?;
    let current = CurrentUser::try_from(claims)?;
    let found = user::find_by_id(state.pool(), current.id).await?;

    // The presented token must match the hash stored at last login
    let stored = found.refresh_token.as_deref().ok_or(AppError::Unauthorized)?;
    if !User::verify_hash(stored, token) {
        tracing::warn!(target: "security", user_id = found.id, "Refresh token mismatch");
        return Err(AppError::InvalidToken);
    }

    let pair = issue_tokens(&state, &found).await?;
    Ok(Json(pair))
}

/// Profile of the authenticated caller, roles included
pub async fn current_user(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<UserWithRoles>> {
    let found = user::find_with_roles(state.pool(), current.id).await?;
    Ok(Json(found))
}

/// Invalidate the caller's refresh token
pub async fn logout(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<bool>> {
    user::set_refresh_token(state.pool(), current.id, None).await?;
    tracing::info!(user_id = current.id, "User logged out");
    Ok(Json(true))
}

async fn issue_tokens(state: &ServerState, found: &User) -> AppResult<TokenPair> {
    let pair = state.jwt.generate_token_pair(found.id, &found.username)?;
    let hash = User::hash_password(&pair.refresh_token)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    user::set_refresh_token(state.pool(), found.id, Some(hash.as_str())).await?;
    Ok(pair)
}
