//! Tracing setup driven by the CLI verbosity flag.
//!
//! `TWOSTEP_LOG_JSON=1` switches the fmt layer to JSON output for log
//! shippers; the default is human-readable.

use anyhow::{Context, Result};
use std::env::var;
use tracing::Level;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

fn json_output() -> bool {
    var("TWOSTEP_LOG_JSON")
        .map(|value| matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

/// Install the global subscriber.
///
/// With no verbosity flag the `RUST_LOG` environment variable still applies,
/// defaulting to errors only.
///
/// # Errors
/// Returns an error if a global subscriber is already installed.
pub fn init(level: Option<Level>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::new(level.to_string().to_lowercase()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
    };

    if json_output() {
        let subscriber = Registry::default().with(filter).with(fmt::layer().json());
        tracing::subscriber::set_global_default(subscriber)
            .context("failed to install tracing subscriber")
    } else {
        let subscriber = Registry::default().with(filter).with(fmt::layer());
        tracing::subscriber::set_global_default(subscriber)
            .context("failed to install tracing subscriber")
    }
}
