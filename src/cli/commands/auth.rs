use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";
pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_ACCESS_TOKEN_TTL_MINUTES: &str = "access-token-ttl-minutes";
pub const ARG_OTP_FRESHNESS_HOURS: &str = "otp-freshness-hours";
pub const ARG_LOGIN_CODE_TTL_SECONDS: &str = "login-code-ttl-seconds";
pub const ARG_RESET_TOKEN_TTL_SECONDS: &str = "reset-token-ttl-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    pub frontend_base_url: String,
    pub jwt_secret: SecretString,
    pub access_token_ttl_minutes: i64,
    pub otp_freshness_hours: i64,
    pub login_code_ttl_seconds: i64,
    pub reset_token_ttl_seconds: i64,
}

impl Options {
    /// Parse auth arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the JWT secret is missing or a TTL is not positive.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let jwt_secret = match matches.get_one::<String>(ARG_JWT_SECRET) {
            Some(value) if !value.trim().is_empty() => SecretString::from(value.clone()),
            _ => anyhow::bail!("missing required argument: --{ARG_JWT_SECRET}"),
        };

        let positive = |id: &str, default: i64| -> anyhow::Result<i64> {
            let value = matches.get_one::<i64>(id).copied().unwrap_or(default);
            if value <= 0 {
                anyhow::bail!("--{id} must be greater than zero");
            }
            Ok(value)
        };

        Ok(Self {
            frontend_base_url: matches
                .get_one::<String>(ARG_FRONTEND_BASE_URL)
                .cloned()
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            jwt_secret,
            access_token_ttl_minutes: positive(ARG_ACCESS_TOKEN_TTL_MINUTES, 30)?,
            otp_freshness_hours: positive(ARG_OTP_FRESHNESS_HOURS, 24)?,
            login_code_ttl_seconds: positive(ARG_LOGIN_CODE_TTL_SECONDS, 300)?,
            reset_token_ttl_seconds: positive(ARG_RESET_TOKEN_TTL_SECONDS, 3600)?,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend base URL used for password reset links")
                .env("HABITRACK_FRONTEND_BASE_URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("Secret used to sign access tokens (HS256)")
                .env("HABITRACK_JWT_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_ACCESS_TOKEN_TTL_MINUTES)
                .long(ARG_ACCESS_TOKEN_TTL_MINUTES)
                .help("Access token lifetime in minutes")
                .env("HABITRACK_ACCESS_TOKEN_TTL_MINUTES")
                .default_value("30")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_OTP_FRESHNESS_HOURS)
                .long(ARG_OTP_FRESHNESS_HOURS)
                .help("Hours a verified OTP keeps password logins challenge-free")
                .env("HABITRACK_OTP_FRESHNESS_HOURS")
                .default_value("24")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_LOGIN_CODE_TTL_SECONDS)
                .long(ARG_LOGIN_CODE_TTL_SECONDS)
                .help("Lifetime of emailed one-time login codes in seconds")
                .env("HABITRACK_LOGIN_CODE_TTL_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_RESET_TOKEN_TTL_SECONDS)
                .long(ARG_RESET_TOKEN_TTL_SECONDS)
                .help("Lifetime of password reset tokens in seconds")
                .env("HABITRACK_RESET_TOKEN_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
}
