use clap::{Arg, Command};

/// Authentication options resolved from CLI matches.
#[derive(Debug)]
pub struct Options {
    pub issuer: String,
    pub session_ttl_seconds: i64,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &clap::ArgMatches) -> Self {
        Self {
            issuer: matches
                .get_one::<String>("issuer")
                .cloned()
                .unwrap_or_else(|| "twostep".to_string()),
            session_ttl_seconds: matches
                .get_one::<i64>("session-ttl-seconds")
                .copied()
                .unwrap_or(604_800),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("issuer")
                .long("issuer")
                .help("Issuer name shown in authenticator apps")
                .env("TWOSTEP_ISSUER")
                .default_value("twostep"),
        )
        .arg(
            Arg::new("session-ttl-seconds")
                .long("session-ttl-seconds")
                .help("Session token TTL in seconds")
                .env("TWOSTEP_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
}
