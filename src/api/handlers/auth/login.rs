//! Password login with the two-factor freshness gate.

use axum::{Json, extract::Extension, http::HeaderMap, response::IntoResponse};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info};

use super::password::verify_password;
use super::principal::require_auth;
use super::state::AuthState;
use super::storage::{lookup_user_by_email, set_last_otp_verified};
use super::types::{LoginRequest, TokenResponse, UserResponse};
use super::utils::normalize_email;
use crate::api::handlers::ApiError;
use crate::totp::LoginChallenge;

const INCORRECT_CREDENTIALS: &str = "Incorrect email or password";

/// Sign a bearer token for `email` with the configured lifetime.
pub(super) fn issue_access_token(
    auth_state: &AuthState,
    email: &str,
) -> anyhow::Result<TokenResponse> {
    let token = auth_state.tokens().issue(
        email,
        Utc::now(),
        auth_state.config().access_token_ttl(),
    )?;
    Ok(TokenResponse::bearer(token))
}

/// Map a gate outcome to the HTTP error, if any.
fn challenge_error(challenge: LoginChallenge) -> Option<ApiError> {
    match challenge {
        LoginChallenge::Skipped | LoginChallenge::Verified { .. } => None,
        LoginChallenge::Missing => Some(ApiError::bad_request("OTP code required")),
        LoginChallenge::Invalid => Some(ApiError::Unauthorized("Invalid OTP code")),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token", body = TokenResponse),
        (status = 400, description = "OTP code required"),
        (status = 401, description = "Incorrect credentials, inactive user or invalid OTP code")
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::bad_request("Missing payload"));
    };

    let email = normalize_email(&request.email);
    let Some(user) = lookup_user_by_email(&pool, &email).await? else {
        return Err(ApiError::Unauthorized(INCORRECT_CREDENTIALS));
    };

    let Some(password_hash) = user.password_hash.clone() else {
        debug!(user_id = %user.id, "Password login for account without password");
        return Err(ApiError::Unauthorized(INCORRECT_CREDENTIALS));
    };
    if !verify_password(request.password, password_hash).await {
        return Err(ApiError::Unauthorized(INCORRECT_CREDENTIALS));
    }

    if !user.is_active {
        return Err(ApiError::Unauthorized("Inactive user"));
    }

    let challenge = user.two_factor().challenge(
        request.otp_code.as_deref(),
        Utc::now(),
        auth_state.config().otp_freshness_window(),
    );
    if let Some(err) = challenge_error(challenge) {
        return Err(err);
    }
    if let LoginChallenge::Verified { at } = challenge {
        set_last_otp_verified(&pool, user.id, at).await?;
    }

    info!(user_id = %user.id, "User logged in");
    Ok(Json(issue_access_token(&auth_state, &user.email)?))
}

/// Current user.
#[utoipa::path(
    get,
    path = "/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    Ok(Json(UserResponse::from(user)))
}
