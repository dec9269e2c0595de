use crate::api::{self, ServiceConfig};
use anyhow::Result;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub issuer: String,
    pub session_ttl_seconds: i64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database connection or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!(
        port = args.port,
        issuer = %args.issuer,
        session_ttl_seconds = args.session_ttl_seconds,
        "Starting server"
    );

    let config = ServiceConfig::new(args.issuer, args.session_ttl_seconds);

    api::new(args.port, args.dsn, config).await
}
