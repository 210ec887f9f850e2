//! Time-based one-time passwords and the login freshness gate.

pub mod freshness;
mod service;

pub use freshness::{LoginChallenge, TwoFactorState, otp_required};
pub use service::{Provisioning, code_at, generate_secret, provisioning, verify_code};

/// Issuer shown by authenticator apps.
pub const ISSUER: &str = "Habitrack";
