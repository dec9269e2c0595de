//! In-memory identity store.
//!
//! Backs the integration tests and local development. The concurrency
//! contract matches the Postgres store: backup-code consumption is one
//! conditional removal inside a single lock scope.

use anyhow::{Context, Result, anyhow};
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use async_trait::async_trait;
use rand::rngs::OsRng;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

use super::{Identity, IdentityStore, MfaEnrollment, MfaFields, password_matches};

#[derive(Default)]
struct StoredIdentity {
    email: String,
    password_hash: String,
    mfa_enabled: bool,
    mfa_secret: Option<Vec<u8>>,
    backup_code_hashes: HashSet<Vec<u8>>,
}

/// Identity store holding everything behind one mutex.
#[derive(Default)]
pub struct InMemoryIdentityStore {
    inner: Mutex<HashMap<Uuid, StoredIdentity>>,
}

impl InMemoryIdentityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an identity with a hashed password, returning its id.
    ///
    /// # Errors
    /// Returns an error if password hashing fails or the lock is poisoned.
    pub fn seed_identity(&self, email: &str, password: &str) -> Result<Uuid> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| anyhow!("failed to hash password: {err}"))?
            .to_string();

        let id = Uuid::new_v4();
        let mut inner = self.lock()?;
        inner.insert(
            id,
            StoredIdentity {
                email: email.trim().to_lowercase(),
                password_hash,
                ..StoredIdentity::default()
            },
        );
        Ok(id)
    }

    /// Count of unconsumed backup codes for an identity.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn backup_code_count(&self, id: Uuid) -> Result<usize> {
        let inner = self.lock()?;
        Ok(inner
            .get(&id)
            .map_or(0, |stored| stored.backup_code_hashes.len()))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, StoredIdentity>>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("identity store lock poisoned"))
    }
}

fn to_identity(id: Uuid, stored: &StoredIdentity) -> Identity {
    Identity {
        id,
        email: stored.email.clone(),
        password_hash: stored.password_hash.clone(),
        mfa: MfaEnrollment {
            enabled: stored.mfa_enabled,
            secret: stored.mfa_secret.clone(),
        },
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let inner = self.lock()?;
        Ok(inner
            .iter()
            .find(|(_, stored)| stored.email == email)
            .map(|(id, stored)| to_identity(*id, stored)))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>> {
        let inner = self.lock()?;
        Ok(inner.get(&id).map(|stored| to_identity(id, stored)))
    }

    async fn update_mfa_fields(&self, id: Uuid, fields: MfaFields) -> Result<()> {
        let mut inner = self.lock()?;
        let stored = inner.get_mut(&id).context("identity no longer exists")?;
        stored.mfa_enabled = fields.enabled;
        stored.mfa_secret = fields.secret;
        stored.backup_code_hashes = fields.backup_code_hashes.into_iter().collect();
        Ok(())
    }

    async fn verify_password(&self, identity: &Identity, plaintext: &str) -> Result<bool> {
        Ok(password_matches(&identity.password_hash, plaintext))
    }

    async fn consume_backup_code_hash(&self, id: Uuid, code_hash: &[u8]) -> Result<bool> {
        // Membership check and removal happen under one lock acquisition, so
        // two concurrent consumers of the same code cannot both succeed.
        let mut inner = self.lock()?;
        let Some(stored) = inner.get_mut(&id) else {
            return Ok(false);
        };
        if !stored.mfa_enabled {
            return Ok(false);
        }
        Ok(stored.backup_code_hashes.remove(code_hash))
    }
}
