//! # Habitrack (todos, habits and pomodoro sessions)
//!
//! `habitrack` is a REST service for personal productivity: todo lists,
//! habits with daily check-ins and streaks, and pomodoro focus sessions.
//!
//! ## Streaks
//!
//! A habit's streak counts consecutive days with an entry, ending today.
//! Recording an entry recomputes it from the most recent 30
//! entries; `best_streak` only ever grows.
//!
//! ## Authentication
//!
//! Passwords are hashed with `bcrypt`, and successful logins receive a
//! short-lived `HS256` bearer token. Users may also sign in with a one-time
//! code sent by email or through Google.
//!
//! Users with two-factor enabled present a TOTP code on password login unless
//! they verified one within the freshness window (24 hours by default). Every
//! verified code re-arms the window.
//!
//! ## Administration
//!
//! Admin users can list, edit and delete accounts and browse every user's
//! todos and habits.

pub mod api;
pub mod cli;
pub mod streak;
pub mod totp;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with("habitrack/"));
        assert!(APP_USER_AGENT.ends_with(env!("CARGO_PKG_VERSION")));
    }
}
