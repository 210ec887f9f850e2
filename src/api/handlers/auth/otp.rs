//! Passwordless login with emailed one-time codes.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use super::login::issue_access_token;
use super::state::AuthState;
use super::storage::{consume_login_code, store_login_code};
use super::types::{EmailRequest, MessageResponse, OtpLoginRequest, TokenResponse};
use super::utils::{generate_login_code, hash_secret, normalize_email, valid_email};
use crate::api::handlers::ApiError;

const INVALID_OTP: &str = "Invalid OTP code";

/// Email a six-digit login code. Any previous code for the address is replaced.
#[utoipa::path(
    post,
    path = "/v1/auth/send-otp",
    request_body = EmailRequest,
    responses(
        (status = 202, description = "Code sent", body = MessageResponse),
        (status = 400, description = "Invalid email")
    ),
    tag = "auth"
)]
pub async fn send_otp(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<EmailRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::bad_request("Missing payload"));
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email"));
    }

    let code = generate_login_code();
    store_login_code(
        &pool,
        &email,
        &code,
        &hash_secret(&code),
        auth_state.config(),
    )
    .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse::new("OTP sent to your email")),
    ))
}

/// Exchange an emailed code for an access token. Unknown emails get a new,
/// verified account. Codes are single-use.
#[utoipa::path(
    post,
    path = "/v1/auth/verify-otp",
    request_body = OtpLoginRequest,
    responses(
        (status = 200, description = "Access token", body = TokenResponse),
        (status = 400, description = "Missing payload"),
        (status = 401, description = "Invalid or expired code, or inactive user")
    ),
    tag = "auth"
)]
pub async fn verify_otp(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<OtpLoginRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::bad_request("Missing payload"));
    };

    let email = normalize_email(&request.email);
    let code = request.otp_code.trim();
    if email.is_empty() || code.is_empty() {
        return Err(ApiError::Unauthorized(INVALID_OTP));
    }

    let Some(user) = consume_login_code(&pool, &email, &hash_secret(code), Utc::now()).await?
    else {
        return Err(ApiError::Unauthorized(INVALID_OTP));
    };

    if !user.is_active {
        return Err(ApiError::Unauthorized("Inactive user"));
    }

    info!(user_id = %user.id, "User logged in with email code");
    Ok(Json(issue_access_token(&auth_state, &user.email)?))
}
