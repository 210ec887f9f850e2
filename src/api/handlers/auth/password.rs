//! bcrypt password hashing, run on the blocking pool.

use anyhow::{Context, Result};
use bcrypt::{DEFAULT_COST, hash, verify};

pub(super) const MIN_PASSWORD_LEN: usize = 8;
// bcrypt only considers the first 72 bytes.
pub(super) const MAX_PASSWORD_BYTES: usize = 72;

pub(super) fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(format!(
            "Password must be at most {MAX_PASSWORD_BYTES} bytes"
        ));
    }
    Ok(())
}

fn hash_with_cost(password: &str, cost: u32) -> Result<String> {
    hash(password, cost).context("failed to hash password")
}

pub(super) async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_with_cost(&password, DEFAULT_COST))
        .await
        .context("password hashing task failed")?
}

/// `false` on mismatch and on malformed hashes.
pub(super) async fn verify_password(password: String, password_hash: String) -> bool {
    tokio::task::spawn_blocking(move || verify(password, &password_hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_and_verify() -> Result<()> {
        let hashed = hash_with_cost("correct horse", 4)?;
        assert!(verify_password("correct horse".to_string(), hashed.clone()).await);
        assert!(!verify_password("wrong horse".to_string(), hashed).await);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_hash_never_verifies() {
        assert!(!verify_password("anything".to_string(), "not-a-hash".to_string()).await);
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
        assert!(validate_password(&"x".repeat(73)).is_err());
    }
}
