//! Database helpers for users, login codes and password reset tokens.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use tracing::Instrument;
use uuid::Uuid;

use super::state::AuthConfig;
use super::utils::{build_reset_url, is_unique_violation, violated_constraint};
use crate::api::email::{self, TEMPLATE_OTP_CODE, TEMPLATE_PASSWORD_RESET};
use crate::totp::TwoFactorState;

pub(crate) const USER_COLUMNS: &str = "id, email, username, full_name, password_hash, is_active, \
     is_verified, is_admin, google_id, profile_picture, is_2fa_enabled, otp_secret, \
     last_otp_verified, created_at";

#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_admin: bool,
    pub google_id: Option<String>,
    pub profile_picture: Option<String>,
    pub is_2fa_enabled: bool,
    pub otp_secret: Option<String>,
    pub last_otp_verified: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub(crate) fn two_factor(&self) -> TwoFactorState {
        TwoFactorState {
            is_2fa_enabled: self.is_2fa_enabled,
            otp_secret: self.otp_secret.clone(),
            last_otp_verified: self.last_otp_verified,
        }
    }
}

pub(super) struct NewUser<'a> {
    pub(super) email: &'a str,
    pub(super) username: Option<&'a str>,
    pub(super) full_name: Option<&'a str>,
    pub(super) password_hash: Option<&'a str>,
}

#[derive(Debug)]
pub(super) enum RegisterOutcome {
    Created(Box<UserRecord>),
    EmailTaken,
    UsernameTaken,
}

/// Google profile fields used to create or link an account.
#[derive(Debug, Clone)]
pub(super) struct GoogleProfile {
    pub(super) google_id: String,
    pub(super) email: String,
    pub(super) name: Option<String>,
    pub(super) picture: Option<String>,
    pub(super) verified_email: bool,
}

pub(crate) async fn lookup_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    sqlx::query_as::<_, UserRecord>(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by email")
}

pub(super) async fn insert_user(pool: &PgPool, user: NewUser<'_>) -> Result<RegisterOutcome> {
    let query = format!(
        r"
        INSERT INTO users (email, username, full_name, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING {USER_COLUMNS}
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let result = sqlx::query_as::<_, UserRecord>(&query)
        .bind(user.email)
        .bind(user.username)
        .bind(user.full_name)
        .bind(user.password_hash)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match result {
        Ok(record) => Ok(RegisterOutcome::Created(Box::new(record))),
        Err(err) if is_unique_violation(&err) => {
            if violated_constraint(&err) == Some("users_username_key") {
                Ok(RegisterOutcome::UsernameTaken)
            } else {
                Ok(RegisterOutcome::EmailTaken)
            }
        }
        Err(err) => Err(err).context("failed to insert user"),
    }
}

/// Re-arm the login freshness window.
pub(super) async fn set_last_otp_verified(
    pool: &PgPool,
    user_id: Uuid,
    verified_at: DateTime<Utc>,
) -> Result<()> {
    let query = "UPDATE users SET last_otp_verified = $2, updated_at = NOW() WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(verified_at)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update last_otp_verified")?;
    Ok(())
}

/// Store the pending TOTP secret; two-factor stays disabled until confirmed.
pub(super) async fn set_otp_secret(pool: &PgPool, user_id: Uuid, secret: &str) -> Result<()> {
    let query = "UPDATE users SET otp_secret = $2, updated_at = NOW() WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(secret)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to store otp secret")?;
    Ok(())
}

pub(super) async fn enable_two_factor(
    pool: &PgPool,
    user_id: Uuid,
    verified_at: DateTime<Utc>,
) -> Result<()> {
    let query = r"
        UPDATE users
        SET is_2fa_enabled = TRUE,
            last_otp_verified = $2,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(verified_at)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to enable two-factor")?;
    Ok(())
}

/// Replace any live login code for `email` and enqueue it for delivery.
pub(super) async fn store_login_code(
    pool: &PgPool,
    email: &str,
    code: &str,
    code_hash: &[u8],
    config: &AuthConfig,
) -> Result<()> {
    let mut tx = pool.begin().await.context("begin login code transaction")?;

    let query = r"
        INSERT INTO email_login_codes (email, code_hash, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
        ON CONFLICT (email) DO UPDATE
        SET code_hash = EXCLUDED.code_hash,
            expires_at = EXCLUDED.expires_at,
            created_at = NOW()
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(email)
        .bind(code_hash)
        .bind(config.login_code_ttl_seconds())
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to store login code")?;

    let payload = json!({
        "code": code,
        "expires_minutes": (config.login_code_ttl_seconds() + 59) / 60,
    });
    email::enqueue(&mut tx, email, TEMPLATE_OTP_CODE, &payload).await?;

    tx.commit().await.context("commit login code transaction")?;
    Ok(())
}

/// Consume a live login code and return the account, creating a verified one
/// when none exists. The freshness window is re-armed at `verified_at`.
/// Returns `None` when the code is wrong or expired.
pub(super) async fn consume_login_code(
    pool: &PgPool,
    email: &str,
    code_hash: &[u8],
    verified_at: DateTime<Utc>,
) -> Result<Option<UserRecord>> {
    let mut tx = pool.begin().await.context("begin verify-otp transaction")?;

    let query = r"
        DELETE FROM email_login_codes
        WHERE email = $1
          AND code_hash = $2
          AND expires_at > NOW()
        RETURNING email
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let consumed = sqlx::query(query)
        .bind(email)
        .bind(code_hash)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to consume login code")?;

    if consumed.is_none() {
        return Ok(None);
    }

    let query = format!(
        r"
        INSERT INTO users (email, is_verified, last_otp_verified)
        VALUES ($1, TRUE, $2)
        ON CONFLICT (email) DO UPDATE
        SET last_otp_verified = EXCLUDED.last_otp_verified,
            updated_at = NOW()
        RETURNING {USER_COLUMNS}
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPSERT",
        db.statement = query.as_str()
    );
    let user = sqlx::query_as::<_, UserRecord>(&query)
        .bind(email)
        .bind(verified_at)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await
        .context("failed to upsert user for login code")?;

    tx.commit().await.context("commit verify-otp transaction")?;
    Ok(Some(user))
}

/// Store a reset token for an existing account and enqueue the link.
/// Returns `false` without side effects when the email is unknown.
pub(super) async fn store_reset_token(
    pool: &PgPool,
    email: &str,
    token: &str,
    token_hash: &[u8],
    config: &AuthConfig,
) -> Result<bool> {
    let mut tx = pool.begin().await.context("begin reset token transaction")?;

    let query = r"
        INSERT INTO password_reset_tokens (token_hash, user_id, expires_at)
        SELECT $2, id, NOW() + ($3 * INTERVAL '1 second')
        FROM users
        WHERE email = $1
        RETURNING user_id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let inserted = sqlx::query(query)
        .bind(email)
        .bind(token_hash)
        .bind(config.reset_token_ttl_seconds())
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to store reset token")?;

    if inserted.is_none() {
        return Ok(false);
    }

    let payload = json!({
        "email": email,
        "reset_url": build_reset_url(config.frontend_base_url(), token),
    });
    email::enqueue(&mut tx, email, TEMPLATE_PASSWORD_RESET, &payload).await?;

    tx.commit().await.context("commit reset token transaction")?;
    Ok(true)
}

/// Consume a reset token and set the new password hash.
/// Returns `false` for unknown, used or expired tokens.
pub(super) async fn consume_reset_token(
    pool: &PgPool,
    token_hash: &[u8],
    password_hash: &str,
) -> Result<bool> {
    let mut tx = pool.begin().await.context("begin reset password transaction")?;

    let query = r"
        UPDATE password_reset_tokens
        SET consumed_at = NOW()
        WHERE token_hash = $1
          AND consumed_at IS NULL
          AND expires_at > NOW()
        RETURNING user_id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row: Option<(Uuid,)> = sqlx::query_as(query)
        .bind(token_hash)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to consume reset token")?;

    let Some((user_id,)) = row else {
        return Ok(false);
    };

    let query = "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(password_hash)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to update password")?;

    tx.commit().await.context("commit reset password transaction")?;
    Ok(true)
}

/// Create a user from a Google profile, or link the profile to the account
/// with the same email. Existing accounts are only linked when Google reports
/// the email as verified; otherwise `None` is returned and nothing changes.
pub(super) async fn upsert_google_user(
    pool: &PgPool,
    profile: &GoogleProfile,
) -> Result<Option<UserRecord>> {
    let query = format!(
        r"
        INSERT INTO users (email, full_name, google_id, profile_picture, is_verified)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE
        SET google_id = EXCLUDED.google_id,
            profile_picture = EXCLUDED.profile_picture,
            is_verified = TRUE,
            updated_at = NOW()
        WHERE EXCLUDED.is_verified
        RETURNING {USER_COLUMNS}
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPSERT",
        db.statement = query.as_str()
    );
    sqlx::query_as::<_, UserRecord>(&query)
        .bind(&profile.email)
        .bind(profile.name.as_deref())
        .bind(&profile.google_id)
        .bind(profile.picture.as_deref())
        .bind(profile.verified_email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to upsert Google user")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_outcome_debug_names() {
        assert_eq!(format!("{:?}", RegisterOutcome::EmailTaken), "EmailTaken");
        assert_eq!(
            format!("{:?}", RegisterOutcome::UsernameTaken),
            "UsernameTaken"
        );
    }

    #[test]
    fn user_columns_cover_record_fields() {
        for column in [
            "id",
            "email",
            "password_hash",
            "is_2fa_enabled",
            "otp_secret",
            "last_otp_verified",
            "created_at",
        ] {
            assert!(USER_COLUMNS.contains(column), "missing {column}");
        }
    }

    #[test]
    fn two_factor_state_mirrors_record() {
        let at = Utc::now();
        let user = UserRecord {
            id: Uuid::nil(),
            email: "a@example.com".to_string(),
            username: None,
            full_name: None,
            password_hash: None,
            is_active: true,
            is_verified: true,
            is_admin: false,
            google_id: None,
            profile_picture: None,
            is_2fa_enabled: true,
            otp_secret: Some("ABC".to_string()),
            last_otp_verified: Some(at),
            created_at: at,
        };
        let state = user.two_factor();
        assert!(state.is_2fa_enabled);
        assert_eq!(state.otp_secret.as_deref(), Some("ABC"));
        assert_eq!(state.last_otp_verified, Some(at));
    }
}
