//! TOTP two-factor enrollment.
//!
//! `enable-2fa` stores a fresh secret and returns provisioning material;
//! two-factor only becomes active once `verify-2fa` confirms a code, which
//! also re-arms the login freshness window.

use axum::{Json, extract::Extension, http::HeaderMap, response::IntoResponse};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use super::principal::require_auth;
use super::state::AuthState;
use super::storage::{enable_two_factor, set_otp_secret};
use super::types::{MessageResponse, OtpCodeRequest, TwoFactorSetupResponse};
use crate::api::handlers::ApiError;
use crate::totp;

#[utoipa::path(
    post,
    path = "/v1/auth/enable-2fa",
    responses(
        (status = 200, description = "Provisioning material", body = TwoFactorSetupResponse),
        (status = 400, description = "Two-factor already enabled"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn enable_2fa(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    if user.is_2fa_enabled {
        return Err(ApiError::bad_request("2FA is already enabled"));
    }

    let secret = totp::generate_secret()?;
    let provisioning = totp::provisioning(&secret, &user.email)?;
    set_otp_secret(&pool, user.id, &secret).await?;

    Ok(Json(TwoFactorSetupResponse {
        secret: provisioning.secret,
        qr_code: provisioning.qr_code,
        otpauth_url: provisioning.otpauth_url,
        message: "Scan the QR code with your authenticator app, then confirm with a code"
            .to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/v1/auth/verify-2fa",
    request_body = OtpCodeRequest,
    responses(
        (status = 200, description = "Two-factor enabled", body = MessageResponse),
        (status = 400, description = "Setup not initiated"),
        (status = 401, description = "Invalid OTP code")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn verify_2fa(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<OtpCodeRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    let Some(Json(request)) = payload else {
        return Err(ApiError::bad_request("Missing payload"));
    };

    let Some(secret) = user.otp_secret.as_deref() else {
        return Err(ApiError::bad_request("2FA setup not initiated"));
    };

    let now = Utc::now();
    if !totp::verify_code(secret, &request.otp_code, now) {
        return Err(ApiError::Unauthorized("Invalid OTP code"));
    }

    enable_two_factor(&pool, user.id, now).await?;
    info!(user_id = %user.id, "Two-factor enabled");

    Ok(Json(MessageResponse::new("2FA enabled successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::AuthConfig;
    use axum::http::StatusCode;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    fn deps() -> anyhow::Result<(Extension<PgPool>, Extension<Arc<AuthState>>)> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let state = AuthState::new(AuthConfig::new(
            "http://localhost:3000".to_string(),
            SecretString::from("test-secret"),
        ))?;
        Ok((Extension(pool), Extension(Arc::new(state))))
    }

    #[tokio::test]
    async fn enable_requires_auth() -> anyhow::Result<()> {
        let (pool, state) = deps()?;
        let response = enable_2fa(HeaderMap::new(), pool, state)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn verify_requires_auth() -> anyhow::Result<()> {
        let (pool, state) = deps()?;
        let request = OtpCodeRequest {
            otp_code: "123456".to_string(),
        };
        let response = verify_2fa(HeaderMap::new(), pool, state, Some(Json(request)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }
}
