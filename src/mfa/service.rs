//! Enrollment and disablement coordination.
//!
//! State machine over an identity's MFA status: `Disabled`, a transient
//! `PendingEnrollment` (candidate secret held by the caller, never persisted),
//! and `Enabled`. Transitions persist through one atomic store write so the
//! enabled/secret invariant survives partial failures.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::activity::{ActivityKind, ActivityRecord, ActivitySink, ClientInfo, record_best_effort};
use crate::error::AuthError;
use crate::identity::{IdentityStore, MfaFields};
use crate::mfa::backup::{BackupCodeBatch, hash_backup_code, normalize_backup_code};
use crate::mfa::provision::{ProvisionedSecret, decode_secret, provision};
use crate::mfa::verify::verify_now;

#[derive(Clone)]
pub struct MfaService {
    store: Arc<dyn IdentityStore>,
    activity: Arc<dyn ActivitySink>,
    issuer: String,
}

impl MfaService {
    #[must_use]
    pub fn new(
        store: Arc<dyn IdentityStore>,
        activity: Arc<dyn ActivitySink>,
        issuer: String,
    ) -> Self {
        Self {
            store,
            activity,
            issuer,
        }
    }

    /// Begin enrollment: generate a candidate secret and provisioning URI.
    ///
    /// Nothing is persisted; the candidate only becomes trusted once the
    /// identity confirms a code derived from it.
    ///
    /// # Errors
    /// `IdentityNotFound` for an unknown id, `AlreadyEnabled` when MFA is
    /// already active, `Store` on collaborator failure.
    pub async fn enroll_begin(&self, identity_id: Uuid) -> Result<ProvisionedSecret, AuthError> {
        let identity = self
            .store
            .find_by_id(identity_id)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        if identity.mfa.enabled {
            return Err(AuthError::AlreadyEnabled);
        }

        Ok(provision(&self.issuer, &identity.email)?)
    }

    /// Confirm enrollment: verify the first code against the candidate secret,
    /// then activate MFA and hand back the plaintext backup codes once.
    ///
    /// On a bad code the identity stays in pending enrollment; the caller may
    /// retry against the same candidate secret.
    ///
    /// # Errors
    /// `InvalidCode` when the code does not match the candidate secret,
    /// `AlreadyEnabled`, `IdentityNotFound`, or `Store`.
    pub async fn enroll_confirm(
        &self,
        identity_id: Uuid,
        secret_base32: &str,
        code: &str,
        client: &ClientInfo,
    ) -> Result<Vec<String>, AuthError> {
        let identity = self
            .store
            .find_by_id(identity_id)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        if identity.mfa.enabled {
            return Err(AuthError::AlreadyEnabled);
        }

        // A candidate that does not decode can never match a code; report it
        // the same way as a wrong code.
        let secret = decode_secret(secret_base32).ok_or(AuthError::InvalidCode)?;
        if !verify_now(&secret, code) {
            return Err(AuthError::InvalidCode);
        }

        let batch = BackupCodeBatch::generate();
        self.store
            .update_mfa_fields(identity_id, MfaFields::enabled(secret, batch.code_hashes))
            .await?;

        info!(%identity_id, "MFA enabled");
        record_best_effort(
            &self.activity,
            ActivityRecord::new(identity_id, ActivityKind::MfaEnabled, client),
        );

        Ok(batch.codes)
    }

    /// Disable MFA after proving possession of the current authenticator.
    ///
    /// Clears the secret, the enabled flag, and all backup codes in one write.
    ///
    /// # Errors
    /// `MfaNotEnabled`, `InvalidCode`, `IdentityNotFound`, or `Store`.
    pub async fn disable(
        &self,
        identity_id: Uuid,
        code: &str,
        client: &ClientInfo,
    ) -> Result<(), AuthError> {
        let identity = self
            .store
            .find_by_id(identity_id)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        let Some(secret) = identity.mfa.secret.filter(|_| identity.mfa.enabled) else {
            return Err(AuthError::MfaNotEnabled);
        };

        if !verify_now(&secret, code) {
            return Err(AuthError::InvalidCode);
        }

        self.store
            .update_mfa_fields(identity_id, MfaFields::disabled())
            .await?;

        info!(%identity_id, "MFA disabled");
        record_best_effort(
            &self.activity,
            ActivityRecord::new(identity_id, ActivityKind::MfaDisabled, client),
        );

        Ok(())
    }

    /// Replace the backup-code set with a fresh batch. Requires a valid
    /// current code; old codes stop working immediately.
    ///
    /// # Errors
    /// `MfaNotEnabled`, `InvalidCode`, `IdentityNotFound`, or `Store`.
    pub async fn regenerate_backup_codes(
        &self,
        identity_id: Uuid,
        code: &str,
    ) -> Result<Vec<String>, AuthError> {
        let identity = self
            .store
            .find_by_id(identity_id)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        let Some(secret) = identity.mfa.secret.filter(|_| identity.mfa.enabled) else {
            return Err(AuthError::MfaNotEnabled);
        };

        if !verify_now(&secret, code) {
            return Err(AuthError::InvalidCode);
        }

        let batch = BackupCodeBatch::generate();
        self.store
            .update_mfa_fields(
                identity_id,
                MfaFields::replacing_backup_codes(secret, batch.code_hashes),
            )
            .await?;

        info!(%identity_id, "Backup codes regenerated");
        Ok(batch.codes)
    }

    /// Consume a backup code, reporting only whether it was valid.
    ///
    /// Disabled MFA, an exhausted code set, and a plain mismatch are
    /// indistinguishable to the caller. Consumption is a single conditional
    /// removal in the store; checking a code spends it.
    ///
    /// # Errors
    /// `Store` on collaborator failure.
    pub async fn consume_backup_code(
        &self,
        identity_id: Uuid,
        code: &str,
    ) -> Result<bool, AuthError> {
        let Some(normalized) = normalize_backup_code(code) else {
            return Ok(false);
        };
        let hash = hash_backup_code(&normalized);
        Ok(self
            .store
            .consume_backup_code_hash(identity_id, &hash)
            .await?)
    }
}
