//! In-memory activity sink for tests and local development.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::Mutex;
use uuid::Uuid;

use super::{ActivityKind, ActivityRecord, ActivitySink};

#[derive(Default)]
pub struct InMemoryActivitySink {
    records: Mutex<Vec<ActivityRecord>>,
}

impl InMemoryActivitySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Kinds recorded for an identity, in insertion order.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn kinds_for(&self, identity_id: Uuid) -> Result<Vec<ActivityKind>> {
        let records = self
            .records
            .lock()
            .map_err(|_| anyhow!("activity sink lock poisoned"))?;
        Ok(records
            .iter()
            .filter(|record| record.identity_id == identity_id)
            .map(|record| record.kind)
            .collect())
    }
}

#[async_trait]
impl ActivitySink for InMemoryActivitySink {
    async fn record(&self, record: ActivityRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| anyhow!("activity sink lock poisoned"))?
            .push(record);
        Ok(())
    }
}
