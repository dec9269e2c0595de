//! # Twostep (MFA & Login Issuance)
//!
//! `twostep` verifies a user's identity across two factors (password plus a
//! time-based one-time code or a single-use backup code) and issues an
//! authenticated session.
//!
//! ## Two-step login
//!
//! - **Step one** checks email and password. Unknown email and wrong password
//!   are indistinguishable to the caller. With MFA disabled a session token is
//!   issued directly; with MFA enabled the caller receives a pending identity
//!   id and no token.
//! - **Step two** honors a one-time code (±1 time step of clock drift) or a
//!   single-use backup code against the re-loaded identity, so disabling MFA
//!   between the steps invalidates the pending login.
//!
//! ## Enrollment
//!
//! Secrets are provisioned but not persisted until the identity confirms a
//! code derived from the candidate secret. Activation persists the secret,
//! the enabled flag, and a fresh set of hashed backup codes in one atomic
//! write; the plaintext codes are returned exactly once.
//!
//! ## Collaborators
//!
//! The identity store, activity sink, and token issuer are injected traits.
//! Activity logging is fire-and-forget: a broken sink never blocks a login.

pub mod activity;
pub mod api;
pub mod cli;
pub mod error;
pub mod identity;
pub mod login;
pub mod mfa;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
