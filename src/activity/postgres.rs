//! Postgres activity sink.
//!
//! NOTE: Schema is draft-only; migrations will be added later.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use super::{ActivityRecord, ActivitySink};

#[derive(Clone)]
pub struct PgActivitySink {
    pool: PgPool,
}

impl PgActivitySink {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivitySink for PgActivitySink {
    async fn record(&self, record: ActivityRecord) -> Result<()> {
        let query = r"
            INSERT INTO activity_log (identity_id, kind, recorded_at, client_ip, client_agent)
            VALUES ($1, $2, $3, $4, $5)
        ";
        sqlx::query(query)
            .bind(record.identity_id)
            .bind(record.kind.as_str())
            .bind(record.recorded_at)
            .bind(record.client_ip.as_deref())
            .bind(record.client_agent.as_deref())
            .execute(&self.pool)
            .await
            .context("failed to insert activity record")?;
        Ok(())
    }
}
