//! Append-only activity log collaborator.
//!
//! Recording is a side effect of a successful state transition, never a
//! correctness requirement: writes go through [`record_best_effort`], which
//! spawns the insert and logs failures instead of surfacing them. A broken
//! sink must never block a login.

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Event kinds emitted by successful state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Login,
    MfaLogin,
    MfaEnabled,
    MfaDisabled,
    BackupCodeUsed,
}

impl ActivityKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::MfaLogin => "MFA_LOGIN",
            Self::MfaEnabled => "MFA_ENABLED",
            Self::MfaDisabled => "MFA_DISABLED",
            Self::BackupCodeUsed => "BACKUP_CODE_USED",
        }
    }
}

/// Request-scoped client metadata attached to activity records.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub agent: Option<String>,
}

/// One append-only activity row. Never mutated or deleted by this subsystem.
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    pub identity_id: Uuid,
    pub kind: ActivityKind,
    pub recorded_at: DateTime<Utc>,
    pub client_ip: Option<String>,
    pub client_agent: Option<String>,
}

impl ActivityRecord {
    #[must_use]
    pub fn new(identity_id: Uuid, kind: ActivityKind, client: &ClientInfo) -> Self {
        Self {
            identity_id,
            kind,
            recorded_at: Utc::now(),
            client_ip: client.ip.clone(),
            client_agent: client.agent.clone(),
        }
    }
}

/// External activity-log collaborator.
#[async_trait]
pub trait ActivitySink: Send + Sync {
    async fn record(&self, record: ActivityRecord) -> Result<()>;
}

/// Fire-and-forget recording. Failures are logged locally and swallowed.
pub fn record_best_effort(sink: &Arc<dyn ActivitySink>, record: ActivityRecord) {
    let sink = Arc::clone(sink);
    tokio::spawn(async move {
        let kind = record.kind;
        let identity_id = record.identity_id;
        if let Err(err) = sink.record(record).await {
            warn!(%identity_id, kind = kind.as_str(), "Failed to record activity: {err:#}");
        }
    });
}
