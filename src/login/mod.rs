//! Two-step login orchestration.
//!
//! Step one checks credentials and either issues a session directly or parks
//! the attempt behind a second-factor challenge. Step two honors a one-time
//! code or a backup code. The second step re-loads the identity and re-checks
//! that MFA is still enabled, so a disable racing between the steps is
//! resolved by re-validation rather than by trusting step one's snapshot. A
//! second factor alone never authenticates.

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::activity::{ActivityKind, ActivityRecord, ActivitySink, ClientInfo, record_best_effort};
use crate::error::AuthError;
use crate::identity::{Identity, IdentityStore};
use crate::mfa::MfaService;
use crate::mfa::verify::verify_now;
use crate::token::TokenIssuer;

/// A completed authentication: the opaque session token and the identity.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub token: String,
    pub identity: Identity,
}

/// Outcome of the credentials step.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Authenticated(Authenticated),
    /// Credentials were valid but a second factor is required. No token has
    /// been issued and nothing has been logged yet; the login is not complete.
    MfaRequired { pending_identity_id: Uuid },
}

#[derive(Clone)]
pub struct LoginService {
    store: Arc<dyn IdentityStore>,
    activity: Arc<dyn ActivitySink>,
    tokens: Arc<dyn TokenIssuer>,
    mfa: MfaService,
}

impl LoginService {
    #[must_use]
    pub fn new(
        store: Arc<dyn IdentityStore>,
        activity: Arc<dyn ActivitySink>,
        tokens: Arc<dyn TokenIssuer>,
        mfa: MfaService,
    ) -> Self {
        Self {
            store,
            activity,
            tokens,
            mfa,
        }
    }

    /// Step one: check email and password.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    ///
    /// # Errors
    /// `InvalidCredentials` on any mismatch, `Store` on collaborator failure.
    pub async fn submit_credentials(
        &self,
        email: &str,
        password: &SecretString,
        client: &ClientInfo,
    ) -> Result<LoginOutcome, AuthError> {
        let email = email.trim().to_lowercase();
        let Some(identity) = self.store.find_by_email(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .store
            .verify_password(&identity, password.expose_secret())
            .await?
        {
            return Err(AuthError::InvalidCredentials);
        }

        if identity.mfa.enabled {
            return Ok(LoginOutcome::MfaRequired {
                pending_identity_id: identity.id,
            });
        }

        let token = self.tokens.issue(&identity).await?;
        info!(identity_id = %identity.id, "Login succeeded");
        record_best_effort(
            &self.activity,
            ActivityRecord::new(identity.id, ActivityKind::Login, client),
        );

        Ok(LoginOutcome::Authenticated(Authenticated {
            token,
            identity,
        }))
    }

    /// Step two: honor a one-time code or a backup code for a pending login.
    ///
    /// Only succeeds for a `pending_identity_id` produced by step one. On a
    /// bad code the pending identity stays open for retry; throttling repeated
    /// attempts belongs to an external middleware layer.
    ///
    /// # Errors
    /// `InvalidCode` on any factor mismatch (including MFA having been
    /// disabled since step one), `InvalidCredentials` if the identity no
    /// longer exists, `Store` on collaborator failure.
    pub async fn submit_second_factor(
        &self,
        pending_identity_id: Uuid,
        code: &str,
        is_backup_code: bool,
        client: &ClientInfo,
    ) -> Result<Authenticated, AuthError> {
        let Some(identity) = self.store.find_by_id(pending_identity_id).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if is_backup_code {
            // The conditional removal in the store already requires MFA to be
            // enabled, so a disable race collapses to a plain invalid code.
            if !self.mfa.consume_backup_code(identity.id, code).await? {
                return Err(AuthError::InvalidCode);
            }
            record_best_effort(
                &self.activity,
                ActivityRecord::new(identity.id, ActivityKind::BackupCodeUsed, client),
            );
        } else {
            let Some(secret) = identity.mfa.secret.as_deref().filter(|_| identity.mfa.enabled)
            else {
                return Err(AuthError::InvalidCode);
            };
            if !verify_now(secret, code) {
                return Err(AuthError::InvalidCode);
            }
        }

        let token = self.tokens.issue(&identity).await?;
        info!(identity_id = %identity.id, "Second factor accepted");
        record_best_effort(
            &self.activity,
            ActivityRecord::new(identity.id, ActivityKind::MfaLogin, client),
        );

        Ok(Authenticated { token, identity })
    }
}
