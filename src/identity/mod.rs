//! Identity records and the store seam.
//!
//! The user store is an external collaborator. This subsystem reads identities
//! and writes nothing but the MFA fields, always as one atomic update. The
//! trait is injected into the services so every test gets a fresh, isolated
//! instance instead of sharing a process-wide client.

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// A user record as seen by this subsystem.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    /// Argon2id PHC string. Verified through the store, never read directly.
    pub password_hash: String,
    pub mfa: MfaEnrollment,
}

/// MFA status belonging 1:1 to an identity.
///
/// Invariant: `secret` is `Some` exactly when `enabled` is true. Both fields
/// change only through [`IdentityStore::update_mfa_fields`], in one write.
#[derive(Debug, Clone, Default)]
pub struct MfaEnrollment {
    pub enabled: bool,
    pub secret: Option<Vec<u8>>,
}

/// One atomic write of the MFA fields plus the replacement backup-code set.
///
/// Constructed only through [`MfaFields::enabled`] and [`MfaFields::disabled`]
/// so the enabled/secret invariant holds by construction.
#[derive(Debug)]
pub struct MfaFields {
    pub(crate) enabled: bool,
    pub(crate) secret: Option<Vec<u8>>,
    pub(crate) backup_code_hashes: Vec<Vec<u8>>,
}

impl MfaFields {
    /// Fields for activating MFA: the confirmed secret and a fresh code set.
    #[must_use]
    pub fn enabled(secret: Vec<u8>, backup_code_hashes: Vec<Vec<u8>>) -> Self {
        Self {
            enabled: true,
            secret: Some(secret),
            backup_code_hashes,
        }
    }

    /// Fields for deactivating MFA: secret and backup codes are cleared.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            secret: None,
            backup_code_hashes: Vec::new(),
        }
    }

    /// Replace the backup-code set while keeping MFA active.
    #[must_use]
    pub fn replacing_backup_codes(secret: Vec<u8>, backup_code_hashes: Vec<Vec<u8>>) -> Self {
        Self::enabled(secret, backup_code_hashes)
    }
}

/// External user-store collaborator.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up an identity by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>>;

    /// Look up an identity by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>>;

    /// Atomically write the MFA fields and replace the stored backup-code set.
    ///
    /// Either every field lands or none does; a partial write must never leave
    /// `enabled` and `secret` inconsistent.
    async fn update_mfa_fields(&self, id: Uuid, fields: MfaFields) -> Result<()>;

    /// Verify a plaintext password against the stored hash.
    ///
    /// Constant-time with respect to the stored hash; an unparseable hash
    /// reports a plain mismatch.
    async fn verify_password(&self, identity: &Identity, plaintext: &str) -> Result<bool>;

    /// Atomically remove one backup-code digest if it is present and MFA is
    /// enabled, reporting whether anything was removed.
    ///
    /// Under concurrent calls with the same digest, at most one returns true.
    /// Implementations must use a single conditional removal, not a
    /// read-then-write sequence.
    async fn consume_backup_code_hash(&self, id: Uuid, code_hash: &[u8]) -> Result<bool>;
}

impl MfaEnrollment {
    /// True when the enabled flag and the stored secret agree.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.enabled == self.secret.is_some()
    }
}

/// Argon2id verification shared by the store implementations.
///
/// The comparison inside `verify_password` is constant-time; an unparseable
/// stored hash reads as a plain mismatch rather than an error.
pub(crate) fn password_matches(stored_hash: &str, plaintext: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mfa_fields_hold_the_invariant_by_construction() {
        let enabled = MfaFields::enabled(vec![1; 20], vec![vec![2; 32]]);
        assert!(enabled.enabled);
        assert!(enabled.secret.is_some());

        let disabled = MfaFields::disabled();
        assert!(!disabled.enabled);
        assert!(disabled.secret.is_none());
        assert!(disabled.backup_code_hashes.is_empty());
    }

    #[test]
    fn enrollment_consistency_check() {
        assert!(MfaEnrollment::default().is_consistent());
        assert!(
            MfaEnrollment {
                enabled: true,
                secret: Some(vec![1; 20]),
            }
            .is_consistent()
        );
        assert!(
            !MfaEnrollment {
                enabled: true,
                secret: None,
            }
            .is_consistent()
        );
    }
}
