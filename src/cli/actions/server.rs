use crate::{
    api::{
        self,
        email::{EmailSender, EmailWorkerConfig, LogEmailSender, SmtpEmailSender},
        handlers::auth::{AuthConfig, GoogleConfig},
    },
    cli::{commands::mail::SmtpOptions, commands::oauth::GoogleOptions},
};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub frontend_base_url: String,
    pub jwt_secret: SecretString,
    pub access_token_ttl_minutes: i64,
    pub otp_freshness_hours: i64,
    pub login_code_ttl_seconds: i64,
    pub reset_token_ttl_seconds: i64,
    pub smtp: Option<SmtpOptions>,
    pub mail_from: String,
    pub email_outbox_poll_seconds: u64,
    pub email_outbox_batch_size: usize,
    pub email_outbox_max_attempts: u32,
    pub email_outbox_backoff_base_seconds: u64,
    pub email_outbox_backoff_max_seconds: u64,
    pub google: Option<GoogleOptions>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the mail transport cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let mut auth_config = AuthConfig::new(args.frontend_base_url, args.jwt_secret)
        .with_access_token_ttl_minutes(args.access_token_ttl_minutes)
        .with_otp_freshness_hours(args.otp_freshness_hours)
        .with_login_code_ttl_seconds(args.login_code_ttl_seconds)
        .with_reset_token_ttl_seconds(args.reset_token_ttl_seconds);

    if let Some(google) = args.google {
        auth_config = auth_config.with_google(GoogleConfig::new(
            google.client_id,
            google.client_secret,
            google.redirect_uri,
        ));
    }

    let email_config = EmailWorkerConfig::new()
        .with_poll_interval_seconds(args.email_outbox_poll_seconds)
        .with_batch_size(args.email_outbox_batch_size)
        .with_max_attempts(args.email_outbox_max_attempts)
        .with_backoff_base_seconds(args.email_outbox_backoff_base_seconds)
        .with_backoff_max_seconds(args.email_outbox_backoff_max_seconds);

    let sender: Arc<dyn EmailSender> = match args.smtp {
        Some(smtp) => {
            info!("Delivering mail through SMTP relay {}:{}", smtp.host, smtp.port);
            Arc::new(SmtpEmailSender::new(
                &smtp.host,
                smtp.port,
                smtp.username.zip(smtp.password),
                &args.mail_from,
            )?)
        }
        None => {
            info!("No SMTP host configured, outgoing mail will be logged");
            Arc::new(LogEmailSender)
        }
    };

    api::new(args.port, args.dsn, auth_config, email_config, sender).await
}
