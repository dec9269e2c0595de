//! Postgres identity store.
//!
//! NOTE: Schema is draft-only; migrations will be added later.
//!
//! Expected tables: `identities` (id, email, password_hash, mfa_enabled,
//! mfa_secret) and `identity_backup_codes` (identity_id, code_hash).

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{Identity, IdentityStore, MfaEnrollment, MfaFields, password_matches};

#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn identity_from_row(row: &sqlx::postgres::PgRow) -> Identity {
    Identity {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        mfa: MfaEnrollment {
            enabled: row.get("mfa_enabled"),
            secret: row.get("mfa_secret"),
        },
    }
}

const SELECT_IDENTITY: &str = r"
    SELECT id, email, password_hash, mfa_enabled, mfa_secret
    FROM identities
";

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let query = format!("{SELECT_IDENTITY} WHERE email = $1 LIMIT 1");
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("failed to look up identity by email")?;
        Ok(row.as_ref().map(identity_from_row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>> {
        let query = format!("{SELECT_IDENTITY} WHERE id = $1 LIMIT 1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to look up identity by id")?;
        Ok(row.as_ref().map(identity_from_row))
    }

    async fn update_mfa_fields(&self, id: Uuid, fields: MfaFields) -> Result<()> {
        // One transaction so the flag, the secret, and the replacement code
        // set land together or not at all.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin MFA update transaction")?;

        let updated = sqlx::query(
            r"
            UPDATE identities
            SET mfa_enabled = $2, mfa_secret = $3
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(fields.enabled)
        .bind(fields.secret.as_deref())
        .execute(&mut *tx)
        .await
        .context("failed to update MFA fields")?;

        if updated.rows_affected() == 0 {
            bail!("identity no longer exists");
        }

        sqlx::query("DELETE FROM identity_backup_codes WHERE identity_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("failed to clear backup codes")?;

        for hash in &fields.backup_code_hashes {
            sqlx::query(
                "INSERT INTO identity_backup_codes (identity_id, code_hash) VALUES ($1, $2)",
            )
            .bind(id)
            .bind(hash.as_slice())
            .execute(&mut *tx)
            .await
            .context("failed to insert backup code")?;
        }

        tx.commit()
            .await
            .context("failed to commit MFA update transaction")?;
        Ok(())
    }

    async fn verify_password(&self, identity: &Identity, plaintext: &str) -> Result<bool> {
        Ok(password_matches(&identity.password_hash, plaintext))
    }

    async fn consume_backup_code_hash(&self, id: Uuid, code_hash: &[u8]) -> Result<bool> {
        // Single conditional removal. Row-level locking inside DELETE makes
        // concurrent consumers of the same digest serialize; only the first
        // sees a row come back.
        let query = r"
            DELETE FROM identity_backup_codes
            USING identities
            WHERE identity_backup_codes.identity_id = $1
              AND identity_backup_codes.code_hash = $2
              AND identities.id = identity_backup_codes.identity_id
              AND identities.mfa_enabled
            RETURNING identity_backup_codes.identity_id
        ";
        let row = sqlx::query(query)
            .bind(id)
            .bind(code_hash)
            .fetch_optional(&self.pool)
            .await
            .context("failed to consume backup code")?;
        Ok(row.is_some())
    }
}
