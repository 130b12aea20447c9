use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_ACCESS_TOKEN_SECRET: &str = "access-token-secret";
pub const ARG_REFRESH_TOKEN_SECRET: &str = "refresh-token-secret";

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_secret_args(command);
    with_ttl_args(command)
}

fn with_secret_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ACCESS_TOKEN_SECRET)
                .long(ARG_ACCESS_TOKEN_SECRET)
                .help("Signing secret for short-lived access tokens")
                .env("LECTORIA_ACCESS_TOKEN_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_REFRESH_TOKEN_SECRET)
                .long(ARG_REFRESH_TOKEN_SECRET)
                .help("Signing secret for refresh tokens (must differ from the access secret)")
                .env("LECTORIA_REFRESH_TOKEN_SECRET")
                .hide_env_values(true)
                .required(true),
        )
}

fn with_ttl_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("access-token-ttl-seconds")
                .long("access-token-ttl-seconds")
                .help("Access token TTL in seconds")
                .env("LECTORIA_ACCESS_TOKEN_TTL_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("refresh-token-ttl-seconds")
                .long("refresh-token-ttl-seconds")
                .help("Refresh token TTL in seconds")
                .env("LECTORIA_REFRESH_TOKEN_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("frontend-base-url")
                .long("frontend-base-url")
                .help("Frontend base URL, used as the allowed CORS origin")
                .env("LECTORIA_FRONTEND_BASE_URL")
                .default_value("https://lectoria.app"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub access_token_secret: SecretString,
    pub refresh_token_secret: SecretString,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub frontend_base_url: String,
}

impl Options {
    /// Collect auth options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a required secret is missing or a TTL is not positive.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let access_token_secret = matches
            .get_one::<String>(ARG_ACCESS_TOKEN_SECRET)
            .cloned()
            .context("missing required argument: --access-token-secret")?;
        let refresh_token_secret = matches
            .get_one::<String>(ARG_REFRESH_TOKEN_SECRET)
            .cloned()
            .context("missing required argument: --refresh-token-secret")?;

        let access_token_ttl_seconds = matches
            .get_one::<i64>("access-token-ttl-seconds")
            .copied()
            .unwrap_or(900);
        let refresh_token_ttl_seconds = matches
            .get_one::<i64>("refresh-token-ttl-seconds")
            .copied()
            .unwrap_or(604_800);

        anyhow::ensure!(
            access_token_ttl_seconds > 0 && refresh_token_ttl_seconds > 0,
            "token TTLs must be positive"
        );

        let frontend_base_url = matches
            .get_one::<String>("frontend-base-url")
            .cloned()
            .unwrap_or_else(|| "https://lectoria.app".to_string());

        Ok(Self {
            access_token_secret: SecretString::from(access_token_secret),
            refresh_token_secret: SecretString::from(refresh_token_secret),
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
            frontend_base_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn matches_from(args: Vec<&str>) -> ArgMatches {
        crate::cli::commands::new().get_matches_from(args)
    }

    #[test]
    fn options_parse_defaults() {
        temp_env::with_vars(
            [
                ("LECTORIA_ACCESS_TOKEN_TTL_SECONDS", None::<&str>),
                ("LECTORIA_REFRESH_TOKEN_TTL_SECONDS", None::<&str>),
                ("LECTORIA_FRONTEND_BASE_URL", None::<&str>),
            ],
            || {
                let matches = matches_from(vec![
                    "lectoria",
                    "--dsn",
                    "postgres://localhost/lectoria",
                    "--access-token-secret",
                    "access-secret",
                    "--refresh-token-secret",
                    "refresh-secret",
                ]);
                let options = Options::parse(&matches).expect("options should parse");

                assert_eq!(options.access_token_secret.expose_secret(), "access-secret");
                assert_eq!(
                    options.refresh_token_secret.expose_secret(),
                    "refresh-secret"
                );
                assert_eq!(options.access_token_ttl_seconds, 900);
                assert_eq!(options.refresh_token_ttl_seconds, 604_800);
                assert_eq!(options.frontend_base_url, "https://lectoria.app");
            },
        );
    }

    #[test]
    fn options_rejects_non_positive_ttl() {
        let matches = matches_from(vec![
            "lectoria",
            "--dsn",
            "postgres://localhost/lectoria",
            "--access-token-secret",
            "access-secret",
            "--refresh-token-secret",
            "refresh-secret",
            "--access-token-ttl-seconds",
            "0",
        ]);
        let result = Options::parse(&matches);
        assert!(result.is_err());
    }
}
