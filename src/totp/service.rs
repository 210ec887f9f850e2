use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use totp_rs::{Algorithm, Secret, TOTP};

use super::ISSUER;

const DIGITS: usize = 6;
const SKEW: u8 = 1;
const STEP_SECONDS: u64 = 30;

/// Enrollment material handed to the user when two-factor is set up.
#[derive(Debug, Clone)]
pub struct Provisioning {
    pub secret: String,
    pub otpauth_url: String,
    /// `data:image/png;base64,...`
    pub qr_code: String,
}

fn build(secret_base32: &str, account_name: &str) -> Result<TOTP> {
    let secret_bytes = Secret::Encoded(secret_base32.to_string())
        .to_bytes()
        .map_err(|e| anyhow!("Secret decode error: {e:?}"))?;

    TOTP::new(
        Algorithm::SHA1,
        DIGITS,
        SKEW,
        STEP_SECONDS,
        secret_bytes,
        Some(ISSUER.to_string()),
        account_name.to_string(),
    )
    .map_err(|e| anyhow!("TOTP init error: {e}"))
}

fn unix_seconds(at: DateTime<Utc>) -> u64 {
    u64::try_from(at.timestamp()).unwrap_or_default()
}

/// Generate a new random base32 secret (160 bits).
///
/// # Errors
/// Returns an error if the random secret cannot be encoded.
pub fn generate_secret() -> Result<String> {
    match Secret::generate_secret().to_encoded() {
        Secret::Encoded(secret) => Ok(secret),
        Secret::Raw(_) => Err(anyhow!("Secret gen error: expected base32 encoding")),
    }
}

/// Build the otpauth URL and QR code for `email`.
///
/// # Errors
/// Returns an error if the secret is malformed or the QR image cannot be rendered.
pub fn provisioning(secret_base32: &str, email: &str) -> Result<Provisioning> {
    let totp = build(secret_base32, email)?;
    let qr = totp
        .get_qr_base64()
        .map_err(|e| anyhow!("QR gen error: {e}"))?;

    Ok(Provisioning {
        secret: totp.get_secret_base32(),
        otpauth_url: totp.get_url(),
        qr_code: format!("data:image/png;base64,{qr}"),
    })
}

/// Check `code` against `secret_base32` at `at`, accepting one step of drift.
#[must_use]
pub fn verify_code(secret_base32: &str, code: &str, at: DateTime<Utc>) -> bool {
    match build(secret_base32, "user") {
        Ok(totp) => totp.check(code.trim(), unix_seconds(at)),
        Err(err) => {
            tracing::warn!("Unable to verify OTP code: {err}");
            false
        }
    }
}

/// Code an authenticator would show at `at`.
///
/// # Errors
/// Returns an error if the secret is malformed.
pub fn code_at(secret_base32: &str, at: DateTime<Utc>) -> Result<String> {
    Ok(build(secret_base32, "user")?.generate(unix_seconds(at)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
    }

    #[test]
    fn generated_secret_is_base32() -> Result<()> {
        let secret = generate_secret()?;
        assert_eq!(secret.len(), 32);
        assert!(
            secret
                .chars()
                .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c))
        );
        Ok(())
    }

    #[test]
    fn current_code_verifies() -> Result<()> {
        let secret = generate_secret()?;
        let code = code_at(&secret, at())?;
        assert_eq!(code.len(), DIGITS);
        assert!(verify_code(&secret, &code, at()));
        Ok(())
    }

    #[test]
    fn one_step_of_drift_is_accepted() -> Result<()> {
        let secret = generate_secret()?;
        let previous = code_at(&secret, at() - TimeDelta::seconds(30))?;
        let next = code_at(&secret, at() + TimeDelta::seconds(30))?;
        assert!(verify_code(&secret, &previous, at()));
        assert!(verify_code(&secret, &next, at()));
        Ok(())
    }

    #[test]
    fn two_steps_of_drift_is_rejected() -> Result<()> {
        let secret = generate_secret()?;
        let old = code_at(&secret, at() - TimeDelta::seconds(90))?;
        let current = code_at(&secret, at())?;
        let adjacent = [
            code_at(&secret, at() - TimeDelta::seconds(30))?,
            code_at(&secret, at() + TimeDelta::seconds(30))?,
        ];
        // Codes can collide by chance; only assert when they differ.
        if old != current && !adjacent.contains(&old) {
            assert!(!verify_code(&secret, &old, at()));
        }
        Ok(())
    }

    #[test]
    fn malformed_secret_never_verifies() {
        assert!(!verify_code("not base32!", "123456", at()));
    }

    #[test]
    fn provisioning_contains_issuer_and_qr() -> Result<()> {
        let secret = generate_secret()?;
        let prov = provisioning(&secret, "alice@example.com")?;
        assert_eq!(prov.secret, secret);
        assert!(prov.otpauth_url.starts_with("otpauth://totp/"));
        assert!(prov.otpauth_url.contains("issuer=Habitrack"));
        assert!(prov.qr_code.starts_with("data:image/png;base64,"));
        Ok(())
    }
}
