//! Authenticated principal extraction and authorization helpers.
//!
//! Read the bearer token, verify it, and resolve the `sub` email to an active
//! user. Admin-only handlers additionally call [`require_admin`].

use axum::http::HeaderMap;
use sqlx::PgPool;
use tracing::debug;

use super::state::AuthState;
use super::storage::{UserRecord, lookup_user_by_email};
use super::utils::bearer_token;
use crate::api::handlers::ApiError;

const INVALID_CREDENTIALS: &str = "Could not validate credentials";

/// Resolve the bearer token into an active user, or return 401.
pub(crate) async fn require_auth(
    headers: &HeaderMap,
    pool: &PgPool,
    auth_state: &AuthState,
) -> Result<UserRecord, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized(INVALID_CREDENTIALS))?;

    let claims = auth_state.tokens().verify(token).map_err(|err| {
        debug!("Rejected access token: {err:#}");
        ApiError::Unauthorized(INVALID_CREDENTIALS)
    })?;

    match lookup_user_by_email(pool, &claims.sub).await? {
        Some(user) if user.is_active => Ok(user),
        Some(_) => Err(ApiError::Unauthorized("Inactive user")),
        None => Err(ApiError::Unauthorized(INVALID_CREDENTIALS)),
    }
}

/// Like [`require_auth`] but also requires `is_admin`, otherwise 403.
pub(crate) async fn require_admin(
    headers: &HeaderMap,
    pool: &PgPool,
    auth_state: &AuthState,
) -> Result<UserRecord, ApiError> {
    let user = require_auth(headers, pool, auth_state).await?;
    if user.is_admin {
        Ok(user)
    } else {
        Err(ApiError::Forbidden("Admin privileges required"))
    }
}
