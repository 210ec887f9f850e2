//! Auth configuration and shared state.

use anyhow::{Context, Result};
use chrono::TimeDelta;
use secrecy::SecretString;
use std::time::Duration;
use url::Url;

use super::token::TokenKeys;
use crate::totp::freshness::DEFAULT_FRESHNESS_WINDOW_HOURS;

const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 30;
const DEFAULT_LOGIN_CODE_TTL_SECONDS: i64 = 5 * 60;
const DEFAULT_RESET_TOKEN_TTL_SECONDS: i64 = 60 * 60;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google OAuth client registration.
#[derive(Clone, Debug)]
pub struct GoogleConfig {
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
}

impl GoogleConfig {
    #[must_use]
    pub fn new(client_id: String, client_secret: SecretString, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
        }
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Consent screen URL the frontend redirects the user to.
    ///
    /// # Errors
    /// Returns an error if the authorization endpoint cannot be parsed.
    pub fn login_url(&self) -> Result<String> {
        let url = Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", "openid email profile"),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .context("failed to build Google login URL")?;
        Ok(url.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    jwt_secret: SecretString,
    access_token_ttl_minutes: i64,
    otp_freshness_hours: i64,
    login_code_ttl_seconds: i64,
    reset_token_ttl_seconds: i64,
    google: Option<GoogleConfig>,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String, jwt_secret: SecretString) -> Self {
        Self {
            frontend_base_url,
            jwt_secret,
            access_token_ttl_minutes: DEFAULT_ACCESS_TOKEN_TTL_MINUTES,
            otp_freshness_hours: DEFAULT_FRESHNESS_WINDOW_HOURS,
            login_code_ttl_seconds: DEFAULT_LOGIN_CODE_TTL_SECONDS,
            reset_token_ttl_seconds: DEFAULT_RESET_TOKEN_TTL_SECONDS,
            google: None,
        }
    }

    #[must_use]
    pub fn with_access_token_ttl_minutes(mut self, minutes: i64) -> Self {
        self.access_token_ttl_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_otp_freshness_hours(mut self, hours: i64) -> Self {
        self.otp_freshness_hours = hours;
        self
    }

    #[must_use]
    pub fn with_login_code_ttl_seconds(mut self, seconds: i64) -> Self {
        self.login_code_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_reset_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_google(mut self, google: GoogleConfig) -> Self {
        self.google = Some(google);
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn jwt_secret(&self) -> &SecretString {
        &self.jwt_secret
    }

    #[must_use]
    pub fn access_token_ttl(&self) -> TimeDelta {
        TimeDelta::minutes(self.access_token_ttl_minutes)
    }

    #[must_use]
    pub fn otp_freshness_window(&self) -> TimeDelta {
        TimeDelta::hours(self.otp_freshness_hours)
    }

    #[must_use]
    pub fn login_code_ttl_seconds(&self) -> i64 {
        self.login_code_ttl_seconds
    }

    #[must_use]
    pub fn reset_token_ttl_seconds(&self) -> i64 {
        self.reset_token_ttl_seconds
    }

    #[must_use]
    pub fn google(&self) -> Option<&GoogleConfig> {
        self.google.as_ref()
    }
}

/// Shared auth state injected into handlers.
pub struct AuthState {
    config: AuthConfig,
    tokens: TokenKeys,
    http: reqwest::Client,
}

impl AuthState {
    /// Derive signing keys and the outbound HTTP client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: AuthConfig) -> Result<Self> {
        let tokens = TokenKeys::from_secret(config.jwt_secret());
        let http = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            config,
            tokens,
            http,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenKeys {
        &self.tokens
    }

    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }
}
