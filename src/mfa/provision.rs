//! Shared-secret provisioning for authenticator-app enrollment.

use anyhow::{Context, Result, anyhow};
use totp_rs::{Algorithm, Secret, TOTP};

use super::verify::{DIGITS, SKEW_STEPS, STEP_SECONDS};

/// A freshly generated candidate secret, not yet trusted or persisted.
///
/// Nothing is written to the store at provisioning time. The caller holds the
/// secret until the owning identity proves possession of the authenticator by
/// confirming a code, which keeps a bare call to `generate` from silently
/// flipping MFA on.
#[derive(Debug)]
pub struct ProvisionedSecret {
    /// Base32-encoded shared secret, compatible with standard authenticator apps.
    pub secret_base32: String,
    /// `otpauth://totp/...` URI. Opaque to this subsystem; rendered (e.g. as a
    /// QR code) by an external collaborator.
    pub provisioning_uri: String,
}

/// Generate a candidate secret and its provisioning URI for an account.
///
/// The secret is 160 bits from a cryptographically secure source.
///
/// # Errors
/// Returns an error if secret generation or URI construction fails.
pub fn provision(issuer: &str, account: &str) -> Result<ProvisionedSecret> {
    let secret = Secret::generate_secret();
    let secret_bytes = secret
        .to_bytes()
        .map_err(|err| anyhow!("secret generation failed: {err:?}"))?;

    let totp = TOTP::new(
        Algorithm::SHA1,
        DIGITS,
        SKEW_STEPS,
        STEP_SECONDS,
        secret_bytes,
        Some(issuer.to_string()),
        account.to_string(),
    )
    .map_err(|err| anyhow!("invalid provisioning parameters: {err}"))
    .context("failed to build provisioning URI")?;

    Ok(ProvisionedSecret {
        secret_base32: totp.get_secret_base32(),
        provisioning_uri: totp.get_url(),
    })
}

/// Decode a base32 candidate secret back into raw bytes.
///
/// Returns `None` for anything that does not decode; callers treat that the
/// same as a failed code check.
#[must_use]
pub fn decode_secret(secret_base32: &str) -> Option<Vec<u8>> {
    Secret::Encoded(secret_base32.trim().to_string())
        .to_bytes()
        .ok()
        .filter(|bytes| !bytes.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn provisions_a_fresh_secret_with_uri() {
        let provisioned = provision("Twostep", "alice@example.com").unwrap();
        assert!(!provisioned.secret_base32.is_empty());
        assert!(provisioned.provisioning_uri.starts_with("otpauth://totp/"));
        assert!(provisioned.provisioning_uri.contains("issuer=Twostep"));
        assert!(
            provisioned
                .provisioning_uri
                .contains(&provisioned.secret_base32)
        );
    }

    #[test]
    fn secret_is_at_least_twenty_bytes() {
        let provisioned = provision("Twostep", "alice@example.com").unwrap();
        let bytes = decode_secret(&provisioned.secret_base32).unwrap();
        assert!(bytes.len() >= 20);
    }

    #[test]
    fn consecutive_secrets_differ() {
        let first = provision("Twostep", "alice@example.com").unwrap();
        let second = provision("Twostep", "alice@example.com").unwrap();
        assert_ne!(first.secret_base32, second.secret_base32);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_secret("not base32 !!!").is_none());
        assert!(decode_secret("").is_none());
    }

    #[test]
    fn decode_round_trips() {
        let provisioned = provision("Twostep", "alice@example.com").unwrap();
        let bytes = decode_secret(&provisioned.secret_base32).unwrap();
        let reencoded = totp_rs::Secret::Raw(bytes).to_encoded();
        assert_eq!(reencoded.to_string(), provisioned.secret_base32);
    }
}
