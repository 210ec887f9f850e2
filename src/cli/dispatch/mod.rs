//! Command-line argument dispatch.
//!
//! Maps validated CLI arguments to the action to run, currently always the
//! API server with its full configuration.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{auth, mail, oauth};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8000);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;
    let mail_opts = mail::Options::parse(matches)?;
    let oauth_opts = oauth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        frontend_base_url: auth_opts.frontend_base_url,
        jwt_secret: auth_opts.jwt_secret,
        access_token_ttl_minutes: auth_opts.access_token_ttl_minutes,
        otp_freshness_hours: auth_opts.otp_freshness_hours,
        login_code_ttl_seconds: auth_opts.login_code_ttl_seconds,
        reset_token_ttl_seconds: auth_opts.reset_token_ttl_seconds,
        smtp: mail_opts.smtp,
        mail_from: mail_opts.from,
        email_outbox_poll_seconds: mail_opts.outbox.poll_seconds,
        email_outbox_batch_size: mail_opts.outbox.batch_size,
        email_outbox_max_attempts: mail_opts.outbox.max_attempts,
        email_outbox_backoff_base_seconds: mail_opts.outbox.backoff_base_seconds,
        email_outbox_backoff_max_seconds: mail_opts.outbox.backoff_max_seconds,
        google: oauth_opts.google,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const DSN: &str = "postgres://user@localhost:5432/habitrack";

    fn cleared<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
        let mut all: Vec<(&str, Option<&str>)> = vec![
            ("HABITRACK_DSN", Some(DSN)),
            ("HABITRACK_JWT_SECRET", Some("s3cret")),
            ("HABITRACK_SMTP_HOST", None),
            ("HABITRACK_SMTP_USERNAME", None),
            ("HABITRACK_SMTP_PASSWORD", None),
            ("HABITRACK_GOOGLE_CLIENT_ID", None),
            ("HABITRACK_GOOGLE_CLIENT_SECRET", None),
            ("HABITRACK_OTP_FRESHNESS_HOURS", None),
        ];
        all.extend_from_slice(vars);
        temp_env::with_vars(all, f);
    }

    fn server_args(matches: &clap::ArgMatches) -> Option<Args> {
        match handler(matches) {
            Ok(Action::Server(args)) => Some(args),
            Err(_) => None,
        }
    }

    #[test]
    fn defaults() {
        cleared(&[], || {
            let matches = crate::cli::commands::new().get_matches_from(vec!["habitrack"]);
            let args = server_args(&matches);
            assert!(args.is_some());
            if let Some(args) = args {
                assert_eq!(args.port, 8000);
                assert_eq!(args.dsn, DSN);
                assert_eq!(args.jwt_secret.expose_secret(), "s3cret");
                assert_eq!(args.access_token_ttl_minutes, 30);
                assert_eq!(args.otp_freshness_hours, 24);
                assert_eq!(args.login_code_ttl_seconds, 300);
                assert_eq!(args.reset_token_ttl_seconds, 3600);
                assert!(args.smtp.is_none());
                assert!(args.google.is_none());
            }
        });
    }

    #[test]
    fn jwt_secret_required() {
        cleared(&[("HABITRACK_JWT_SECRET", None)], || {
            let matches = crate::cli::commands::new().get_matches_from(vec!["habitrack"]);
            let result = handler(&matches);
            assert!(result.is_err());
            if let Err(err) = result {
                assert!(
                    err.to_string()
                        .contains("missing required argument: --jwt-secret")
                );
            }
        });
    }

    #[test]
    fn zero_freshness_window_rejected() {
        cleared(&[("HABITRACK_OTP_FRESHNESS_HOURS", Some("0"))], || {
            let matches = crate::cli::commands::new().get_matches_from(vec!["habitrack"]);
            assert!(handler(&matches).is_err());
        });
    }

    #[test]
    fn smtp_credentials_must_pair() {
        cleared(
            &[
                ("HABITRACK_SMTP_HOST", Some("smtp.example.com")),
                ("HABITRACK_SMTP_USERNAME", Some("mailer")),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["habitrack"]);
                assert!(handler(&matches).is_err());
            },
        );
    }

    #[test]
    fn smtp_and_google_configured() {
        cleared(
            &[
                ("HABITRACK_SMTP_HOST", Some("smtp.example.com")),
                ("HABITRACK_SMTP_USERNAME", Some("mailer")),
                ("HABITRACK_SMTP_PASSWORD", Some("hunter2")),
                ("HABITRACK_GOOGLE_CLIENT_ID", Some("client-id")),
                ("HABITRACK_GOOGLE_CLIENT_SECRET", Some("client-secret")),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["habitrack"]);
                let args = server_args(&matches);
                assert!(args.is_some());
                if let Some(args) = args {
                    let smtp = args.smtp.map(|smtp| (smtp.host, smtp.port, smtp.username));
                    assert_eq!(
                        smtp,
                        Some((
                            "smtp.example.com".to_string(),
                            587,
                            Some("mailer".to_string())
                        ))
                    );
                    let google = args.google.map(|google| google.client_id);
                    assert_eq!(google, Some("client-id".to_string()));
                }
            },
        );
    }

    #[test]
    fn google_secret_required_with_client_id() {
        cleared(&[("HABITRACK_GOOGLE_CLIENT_ID", Some("client-id"))], || {
            let matches = crate::cli::commands::new().get_matches_from(vec!["habitrack"]);
            assert!(handler(&matches).is_err());
        });
    }
}
