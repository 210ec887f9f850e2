//! Login freshness gate for two-factor users.
//!
//! A successful OTP verification keeps password logins challenge-free for a
//! configured window. Every verified code re-arms the window; logins that skip
//! the challenge do not extend it.

use chrono::{DateTime, TimeDelta, Utc};

use super::verify_code;

pub const DEFAULT_FRESHNESS_WINDOW_HOURS: i64 = 24;

/// Default freshness window (24 hours).
#[must_use]
pub fn default_window() -> TimeDelta {
    TimeDelta::hours(DEFAULT_FRESHNESS_WINDOW_HOURS)
}

/// Decide whether a password login must present an OTP code.
#[must_use]
pub fn otp_required(
    is_2fa_enabled: bool,
    last_otp_verified: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    freshness_window: TimeDelta,
) -> bool {
    if !is_2fa_enabled {
        return false;
    }

    match last_otp_verified {
        None => true,
        Some(verified_at) => now.signed_duration_since(verified_at) >= freshness_window,
    }
}

/// Two-factor fields of a user, as loaded for a login attempt.
#[derive(Debug, Clone, Default)]
pub struct TwoFactorState {
    pub is_2fa_enabled: bool,
    pub otp_secret: Option<String>,
    pub last_otp_verified: Option<DateTime<Utc>>,
}

/// Result of running the gate against the code supplied with a login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginChallenge {
    /// Two-factor disabled or still within the freshness window.
    Skipped,
    /// Code checked successfully; the caller stores `at` as `last_otp_verified`.
    Verified { at: DateTime<Utc> },
    /// A code is required but none was supplied.
    Missing,
    /// A code was supplied but did not match.
    Invalid,
}

impl TwoFactorState {
    #[must_use]
    pub fn challenge(
        &self,
        code: Option<&str>,
        now: DateTime<Utc>,
        freshness_window: TimeDelta,
    ) -> LoginChallenge {
        if !otp_required(
            self.is_2fa_enabled,
            self.last_otp_verified,
            now,
            freshness_window,
        ) {
            return LoginChallenge::Skipped;
        }

        let Some(code) = code.map(str::trim).filter(|code| !code.is_empty()) else {
            return LoginChallenge::Missing;
        };

        // 2FA enabled without a stored secret cannot be satisfied.
        let Some(secret) = self.otp_secret.as_deref() else {
            return LoginChallenge::Invalid;
        };

        if verify_code(secret, code, now) {
            LoginChallenge::Verified { at: now }
        } else {
            LoginChallenge::Invalid
        }
    }

    /// Apply the outcome of a challenge, re-arming the window on success.
    pub fn apply(&mut self, challenge: LoginChallenge) {
        if let LoginChallenge::Verified { at } = challenge {
            self.last_otp_verified = Some(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::totp::{code_at, generate_secret};

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
    }

    #[test]
    fn disabled_never_requires() {
        assert!(!otp_required(false, None, now(), default_window()));
        assert!(!otp_required(
            false,
            Some(now() - TimeDelta::hours(100)),
            now(),
            default_window()
        ));
    }

    #[test]
    fn enabled_never_verified_requires() {
        assert!(otp_required(true, None, now(), default_window()));
    }

    #[test]
    fn verified_23_hours_ago_is_fresh() {
        let verified = now() - TimeDelta::hours(23);
        assert!(!otp_required(true, Some(verified), now(), default_window()));
    }

    #[test]
    fn verified_25_hours_ago_is_stale() {
        let verified = now() - TimeDelta::hours(25);
        assert!(otp_required(true, Some(verified), now(), default_window()));
    }

    #[test]
    fn window_boundary_requires() {
        let verified = now() - default_window();
        assert!(otp_required(true, Some(verified), now(), default_window()));
        let just_inside = verified + TimeDelta::seconds(1);
        assert!(!otp_required(
            true,
            Some(just_inside),
            now(),
            default_window()
        ));
    }

    #[test]
    fn challenge_missing_and_invalid() {
        let state = TwoFactorState {
            is_2fa_enabled: true,
            otp_secret: generate_secret().ok(),
            last_otp_verified: None,
        };
        assert_eq!(
            state.challenge(None, now(), default_window()),
            LoginChallenge::Missing
        );
        assert_eq!(
            state.challenge(Some("  "), now(), default_window()),
            LoginChallenge::Missing
        );
        assert_eq!(
            state.challenge(Some("abcdef"), now(), default_window()),
            LoginChallenge::Invalid
        );
    }

    #[test]
    fn enabled_without_secret_is_invalid() {
        let state = TwoFactorState {
            is_2fa_enabled: true,
            otp_secret: None,
            last_otp_verified: None,
        };
        assert_eq!(
            state.challenge(Some("123456"), now(), default_window()),
            LoginChallenge::Invalid
        );
    }

    #[test]
    fn verified_login_rearms_window() -> anyhow::Result<()> {
        let secret = generate_secret()?;
        let t0 = now();
        let mut state = TwoFactorState {
            is_2fa_enabled: true,
            otp_secret: Some(secret.clone()),
            last_otp_verified: None,
        };

        let code = code_at(&secret, t0)?;
        let challenge = state.challenge(Some(&code), t0, default_window());
        assert_eq!(challenge, LoginChallenge::Verified { at: t0 });
        state.apply(challenge);

        // Within the window no code is needed, and skipping does not extend it.
        let t23 = t0 + TimeDelta::hours(23);
        let challenge = state.challenge(None, t23, default_window());
        assert_eq!(challenge, LoginChallenge::Skipped);
        state.apply(challenge);
        assert_eq!(state.last_otp_verified, Some(t0));

        let t25 = t0 + TimeDelta::hours(25);
        assert_eq!(
            state.challenge(None, t25, default_window()),
            LoginChallenge::Missing
        );

        let code = code_at(&secret, t25)?;
        let challenge = state.challenge(Some(&code), t25, default_window());
        state.apply(challenge);
        assert_eq!(state.last_otp_verified, Some(t25));

        let later = t25 + TimeDelta::hours(23);
        assert_eq!(
            state.challenge(None, later, default_window()),
            LoginChallenge::Skipped
        );
        Ok(())
    }
}
