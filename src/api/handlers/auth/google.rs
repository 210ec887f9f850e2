//! Google OAuth 2.0 sign-in.
//!
//! The frontend sends the user to [`google_login`]'s URL; Google redirects
//! back with a `code` that [`google_callback`] exchanges for a profile.
//! Accounts are linked by email, or created when none exists.

use anyhow::{Context, Result, anyhow};
use axum::{
    Json,
    extract::{Extension, Query},
    response::IntoResponse,
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

use super::login::issue_access_token;
use super::state::{AuthState, GoogleConfig};
use super::storage::{GoogleProfile, upsert_google_user};
use super::types::{GoogleCallbackQuery, GoogleLoginResponse, TokenResponse};
use super::utils::{normalize_email, valid_email};
use crate::api::handlers::ApiError;

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const NOT_CONFIGURED: &str = "Google OAuth is not configured";

#[derive(Deserialize, Debug)]
struct TokenExchange {
    access_token: String,
}

#[derive(Deserialize, Debug)]
struct GoogleUserInfo {
    id: String,
    email: String,
    name: Option<String>,
    picture: Option<String>,
    #[serde(default)]
    verified_email: bool,
}

impl GoogleUserInfo {
    fn into_profile(self) -> Result<GoogleProfile> {
        let email = normalize_email(&self.email);
        if !valid_email(&email) {
            return Err(anyhow!("profile has no usable email"));
        }
        Ok(GoogleProfile {
            google_id: self.id,
            email,
            name: self.name,
            picture: self.picture,
            verified_email: self.verified_email,
        })
    }
}

async fn fetch_profile(
    http: &reqwest::Client,
    google: &GoogleConfig,
    code: &str,
) -> Result<GoogleProfile> {
    let exchange: TokenExchange = http
        .post(GOOGLE_TOKEN_URL)
        .form(&[
            ("code", code),
            ("client_id", google.client_id()),
            ("client_secret", google.client_secret().expose_secret()),
            ("redirect_uri", google.redirect_uri()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .context("token request failed")?
        .error_for_status()
        .context("token exchange rejected")?
        .json()
        .await
        .context("invalid token response")?;

    let info: GoogleUserInfo = http
        .get(GOOGLE_USERINFO_URL)
        .bearer_auth(&exchange.access_token)
        .send()
        .await
        .context("userinfo request failed")?
        .error_for_status()
        .context("userinfo rejected")?
        .json()
        .await
        .context("invalid userinfo response")?;

    info.into_profile()
}

#[utoipa::path(
    get,
    path = "/v1/auth/google/login",
    responses(
        (status = 200, description = "Google consent URL", body = GoogleLoginResponse),
        (status = 503, description = "Google OAuth is not configured")
    ),
    tag = "auth"
)]
pub async fn google_login(
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let google = auth_state
        .config()
        .google()
        .ok_or(ApiError::ServiceUnavailable(NOT_CONFIGURED))?;
    Ok(Json(GoogleLoginResponse {
        url: google.login_url()?,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/auth/google/callback",
    params(GoogleCallbackQuery),
    responses(
        (status = 200, description = "Access token", body = TokenResponse),
        (status = 400, description = "Google authentication failed or email not verified"),
        (status = 401, description = "Inactive user"),
        (status = 503, description = "Google OAuth is not configured")
    ),
    tag = "auth"
)]
pub async fn google_callback(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    query: Query<GoogleCallbackQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let google = auth_state
        .config()
        .google()
        .ok_or(ApiError::ServiceUnavailable(NOT_CONFIGURED))?;

    let code = query.code.trim();
    if code.is_empty() {
        return Err(ApiError::bad_request("Missing authorization code"));
    }

    let profile = fetch_profile(auth_state.http(), google, code)
        .await
        .map_err(|err| {
            warn!("Google authentication failed: {err:#}");
            ApiError::bad_request(format!("Google authentication failed: {err}"))
        })?;

    let Some(user) = upsert_google_user(&pool, &profile).await? else {
        warn!("Refusing to link an unverified Google email to an existing account");
        return Err(ApiError::bad_request(
            "Google authentication failed: email is not verified",
        ));
    };
    if !user.is_active {
        return Err(ApiError::Unauthorized("Inactive user"));
    }

    info!(user_id = %user.id, "User logged in with Google");
    Ok(Json(issue_access_token(&auth_state, &user.email)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::AuthConfig;
    use axum::http::StatusCode;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    fn state(google: Option<GoogleConfig>) -> anyhow::Result<Arc<AuthState>> {
        let mut config = AuthConfig::new(
            "http://localhost:3000".to_string(),
            SecretString::from("test-secret"),
        );
        if let Some(google) = google {
            config = config.with_google(google);
        }
        Ok(Arc::new(AuthState::new(config)?))
    }

    #[tokio::test]
    async fn login_unconfigured_is_unavailable() -> anyhow::Result<()> {
        let response = google_login(Extension(state(None)?)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        Ok(())
    }

    #[tokio::test]
    async fn login_configured_returns_url() -> anyhow::Result<()> {
        let google = GoogleConfig::new(
            "client-id".to_string(),
            SecretString::from("client-secret"),
            "http://localhost:8000/v1/auth/google/callback".to_string(),
        );
        let response = google_login(Extension(state(Some(google))?))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn callback_unconfigured_is_unavailable() -> anyhow::Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let query = GoogleCallbackQuery {
            code: "abc".to_string(),
        };
        let response = google_callback(Extension(pool), Extension(state(None)?), Query(query))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        Ok(())
    }

    #[test]
    fn userinfo_normalizes_email() -> anyhow::Result<()> {
        let info: GoogleUserInfo = serde_json::from_str(
            r#"{"id":"42","email":"Alice@Example.com","name":"Alice","verified_email":true}"#,
        )?;
        let profile = info.into_profile()?;
        assert_eq!(profile.email, "alice@example.com");
        assert_eq!(profile.google_id, "42");
        assert!(profile.verified_email);
        assert!(profile.picture.is_none());
        Ok(())
    }

    #[test]
    fn userinfo_without_valid_email_is_rejected() -> anyhow::Result<()> {
        let info: GoogleUserInfo = serde_json::from_str(r#"{"id":"42","email":""}"#)?;
        assert!(info.into_profile().is_err());
        Ok(())
    }
}
