//! Opaque session-token issuance.
//!
//! The token format is deliberately opaque to the rest of the subsystem:
//! callers receive a string and never inspect it. The raw value is returned
//! exactly once; the store only ever sees its SHA-256 digest.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use base64::Engine;
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::identity::Identity;

/// External token-issuer collaborator.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Issue an opaque session token for an authenticated identity.
    async fn issue(&self, identity: &Identity) -> Result<String>;
}

/// Generate a random session token.
///
/// # Errors
/// Returns an error if the random source fails.
pub fn generate_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session token")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Hash a token so raw values never touch the database.
#[must_use]
pub fn hash_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// Issuer that persists hashed session tokens in Postgres.
///
/// NOTE: Schema is draft-only; migrations will be added later.
#[derive(Clone)]
pub struct PgTokenIssuer {
    pool: PgPool,
    ttl_seconds: i64,
}

impl PgTokenIssuer {
    #[must_use]
    pub fn new(pool: PgPool, ttl_seconds: i64) -> Self {
        Self { pool, ttl_seconds }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[async_trait]
impl TokenIssuer for PgTokenIssuer {
    async fn issue(&self, identity: &Identity) -> Result<String> {
        let query = r"
            INSERT INTO identity_sessions (identity_id, token_hash, expires_at)
            VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
        ";

        // Collisions on the 256-bit token are not expected; the retry keeps a
        // unique index on token_hash from ever failing a login.
        for _ in 0..3 {
            let token = generate_token()?;
            let token_hash = hash_token(&token);
            let result = sqlx::query(query)
                .bind(identity.id)
                .bind(token_hash)
                .bind(self.ttl_seconds)
                .execute(&self.pool)
                .await;

            match result {
                Ok(_) => return Ok(token),
                Err(err) if is_unique_violation(&err) => {}
                Err(err) => return Err(err).context("failed to insert session"),
            }
        }

        Err(anyhow!("failed to generate unique session token"))
    }
}

/// Issuer that mints tokens without persisting them. Used by tests and local
/// development together with the in-memory stores.
#[derive(Default)]
pub struct EphemeralTokenIssuer;

#[async_trait]
impl TokenIssuer for EphemeralTokenIssuer {
    async fn issue(&self, _identity: &Identity) -> Result<String> {
        generate_token()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_url_safe_and_unique() {
        let first = generate_token().unwrap();
        let second = generate_token().unwrap();
        assert_ne!(first, second);
        assert!(
            first
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        );
    }

    #[test]
    fn stored_digest_differs_from_token() {
        let token = generate_token().unwrap();
        let digest = hash_token(&token);
        assert_eq!(digest.len(), 32);
        assert_ne!(digest.as_slice(), token.as_bytes());
    }
}
