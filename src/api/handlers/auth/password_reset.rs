//! Forgot/reset password flow.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};

use super::password::{hash_password, validate_password};
use super::state::AuthState;
use super::storage::{consume_reset_token, store_reset_token};
use super::types::{EmailRequest, MessageResponse, ResetPasswordRequest};
use super::utils::{generate_reset_token, hash_secret, normalize_email, valid_email};
use crate::api::handlers::ApiError;

const FORGOT_PASSWORD_MESSAGE: &str = "If the email is registered, a reset link has been sent";

/// Always answers 202, whether or not the email is registered.
#[utoipa::path(
    post,
    path = "/v1/auth/forgot-password",
    request_body = EmailRequest,
    responses(
        (status = 202, description = "Reset requested", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<EmailRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::bad_request("Missing payload"));
    };

    let accepted = (
        StatusCode::ACCEPTED,
        Json(MessageResponse::new(FORGOT_PASSWORD_MESSAGE)),
    );

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Ok(accepted);
    }

    let token = generate_reset_token()?;
    match store_reset_token(
        &pool,
        &email,
        &token,
        &hash_secret(&token),
        auth_state.config(),
    )
    .await
    {
        Ok(true) => info!("Password reset requested"),
        Ok(false) => {}
        Err(err) => error!("Failed to store reset token: {err:#}"),
    }

    Ok(accepted)
}

#[utoipa::path(
    post,
    path = "/v1/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Invalid or expired token, or weak password")
    ),
    tag = "auth"
)]
pub async fn reset_password(
    pool: Extension<PgPool>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::bad_request("Missing payload"));
    };

    let token = request.token.trim();
    if token.is_empty() {
        return Err(ApiError::bad_request("Invalid or expired token"));
    }
    validate_password(&request.new_password).map_err(ApiError::BadRequest)?;

    let password_hash = hash_password(request.new_password).await?;
    if !consume_reset_token(&pool, &hash_secret(token), &password_hash).await? {
        return Err(ApiError::bad_request("Invalid or expired token"));
    }

    Ok(Json(MessageResponse::new("Password has been reset")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::AuthConfig;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    fn pool() -> anyhow::Result<PgPool> {
        Ok(PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?)
    }

    #[tokio::test]
    async fn forgot_password_invalid_email_still_accepted() -> anyhow::Result<()> {
        let state = AuthState::new(AuthConfig::new(
            "http://localhost:3000".to_string(),
            SecretString::from("test-secret"),
        ))?;
        let request = EmailRequest {
            email: "not-an-email".to_string(),
        };
        let response = forgot_password(
            Extension(pool()?),
            Extension(Arc::new(state)),
            Some(Json(request)),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        Ok(())
    }

    #[tokio::test]
    async fn reset_password_rejects_blank_token() -> anyhow::Result<()> {
        let request = ResetPasswordRequest {
            token: " ".to_string(),
            new_password: "long-enough".to_string(),
        };
        let response = reset_password(Extension(pool()?), Some(Json(request)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn reset_password_rejects_weak_password() -> anyhow::Result<()> {
        let request = ResetPasswordRequest {
            token: "token".to_string(),
            new_password: "short".to_string(),
        };
        let response = reset_password(Extension(pool()?), Some(Json(request)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
