//! Time-step one-time-code verification.
//!
//! Verification is pure with respect to persisted state: checking a code never
//! consumes it and may be repeated. Malformed secrets and malformed codes both
//! return `false` so the caller cannot tell which input was rejected.

use std::time::{SystemTime, UNIX_EPOCH};
use totp_rs::{Algorithm, TOTP};

/// Digits in a generated code.
pub const DIGITS: usize = 6;

/// Length of one time step in seconds.
pub const STEP_SECONDS: u64 = 30;

/// Accepted drift, in steps, on either side of the reference time. Fixed by
/// design, not user-configurable.
pub const SKEW_STEPS: u8 = 1;

/// Check a submitted code against a shared secret at an explicit Unix time.
///
/// Accepts the code for the current step and the immediately adjacent steps
/// (up to 30 seconds of clock skew in either direction).
#[must_use]
pub fn verify_at(secret: &[u8], code: &str, unix_time: u64) -> bool {
    let Some(code) = normalize_code(code) else {
        return false;
    };
    // A short or otherwise unusable secret fails construction; report a plain
    // mismatch instead of surfacing why.
    let Ok(totp) = build_totp(secret) else {
        return false;
    };
    totp.check(&code, unix_time)
}

/// Check a submitted code against a shared secret at the current system time.
#[must_use]
pub fn verify_now(secret: &[u8], code: &str) -> bool {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => verify_at(secret, code, elapsed.as_secs()),
        Err(_) => false,
    }
}

/// Strip separators users commonly paste in, then require exactly six digits.
fn normalize_code(code: &str) -> Option<String> {
    let code = code.trim().replace([' ', '-'], "");
    if code.len() == DIGITS && code.bytes().all(|byte| byte.is_ascii_digit()) {
        Some(code)
    } else {
        None
    }
}

fn build_totp(secret: &[u8]) -> Result<TOTP, totp_rs::TotpUrlError> {
    // The label is irrelevant for checking; provisioning URIs are built in
    // `provision` with the real issuer and account.
    TOTP::new(
        Algorithm::SHA1,
        DIGITS,
        SKEW_STEPS,
        STEP_SECONDS,
        secret.to_vec(),
        None,
        "account".to_string(),
    )
}

#[cfg(test)]
pub(crate) fn code_at(secret: &[u8], unix_time: u64) -> String {
    build_totp(secret).map_or_else(|_| String::new(), |totp| totp.generate(unix_time))
}
