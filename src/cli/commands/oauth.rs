use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_GOOGLE_CLIENT_ID: &str = "google-client-id";
pub const ARG_GOOGLE_CLIENT_SECRET: &str = "google-client-secret";
pub const ARG_GOOGLE_REDIRECT_URI: &str = "google-redirect-uri";

#[derive(Debug, Clone)]
pub struct GoogleOptions {
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    pub google: Option<GoogleOptions>,
}

impl Options {
    /// Parse Google sign-in arguments. Google is disabled when no client id is set.
    ///
    /// # Errors
    /// Returns an error if a client id is given without its secret.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let Some(client_id) = get_non_empty(ARG_GOOGLE_CLIENT_ID) else {
            return Ok(Self::default());
        };

        let Some(client_secret) = get_non_empty(ARG_GOOGLE_CLIENT_SECRET) else {
            anyhow::bail!("missing required argument: --{ARG_GOOGLE_CLIENT_SECRET}");
        };

        Ok(Self {
            google: Some(GoogleOptions {
                client_id,
                client_secret: SecretString::from(client_secret),
                redirect_uri: get_non_empty(ARG_GOOGLE_REDIRECT_URI).unwrap_or_else(|| {
                    "http://localhost:8000/v1/auth/google/callback".to_string()
                }),
            }),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_GOOGLE_CLIENT_ID)
                .long(ARG_GOOGLE_CLIENT_ID)
                .help("Google OAuth client id; Google sign-in is disabled when unset")
                .env("HABITRACK_GOOGLE_CLIENT_ID"),
        )
        .arg(
            Arg::new(ARG_GOOGLE_CLIENT_SECRET)
                .long(ARG_GOOGLE_CLIENT_SECRET)
                .help("Google OAuth client secret")
                .env("HABITRACK_GOOGLE_CLIENT_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_GOOGLE_REDIRECT_URI)
                .long(ARG_GOOGLE_REDIRECT_URI)
                .help("Redirect URI registered with Google")
                .env("HABITRACK_GOOGLE_REDIRECT_URI")
                .default_value("http://localhost:8000/v1/auth/google/callback"),
        )
}
