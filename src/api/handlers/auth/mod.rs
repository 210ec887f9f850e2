//! Auth handlers and supporting modules.
//!
//! Bearer JWT access tokens (HS256, `sub` = email) are issued by password
//! login, emailed one-time codes and Google OAuth. Password logins for
//! two-factor users pass through the freshness gate in
//! [`crate::totp::freshness`]: a verified TOTP code keeps subsequent logins
//! challenge-free for the configured window.
//!
//! One-time codes and reset tokens are stored as SHA-256 hashes; the raw
//! values only leave the server through the email outbox.

pub(crate) mod google;
pub(crate) mod login;
pub(crate) mod otp;
mod password;
pub(crate) mod password_reset;
pub(crate) mod principal;
pub(crate) mod register;
mod state;
pub(crate) mod storage;
mod token;
pub(crate) mod two_factor;
pub(crate) mod types;
pub(crate) mod utils;

pub use state::{AuthConfig, AuthState, GoogleConfig};
pub use token::{Claims, TokenKeys};
