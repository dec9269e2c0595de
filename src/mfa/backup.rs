//! Backup-code generation and hashing.
//!
//! Backup codes are single-use recovery credentials that substitute for a
//! one-time code. Only the SHA-256 digest of a normalized code is ever stored;
//! the plaintext exists exactly once, at generation time, in the batch handed
//! back to the caller.

use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

/// Codes per generated batch.
pub const BACKUP_CODE_COUNT: usize = 10;

const CODE_HEX_LEN: usize = 8;
const CODE_GROUP_SIZE: usize = 4;

/// A freshly generated batch: plaintext codes plus their stored digests.
#[derive(Debug)]
pub struct BackupCodeBatch {
    pub codes: Vec<String>,
    pub code_hashes: Vec<Vec<u8>>,
}

impl BackupCodeBatch {
    /// Generate ten codes of eight uppercase hex characters, formatted as two
    /// hyphen-separated groups of four (`A1B2-C3D4`).
    #[must_use]
    pub fn generate() -> Self {
        let mut codes = Vec::with_capacity(BACKUP_CODE_COUNT);
        let mut code_hashes = Vec::with_capacity(BACKUP_CODE_COUNT);
        for _ in 0..BACKUP_CODE_COUNT {
            let normalized = generate_code(&mut OsRng);
            code_hashes.push(hash_backup_code(&normalized));
            codes.push(format_backup_code(&normalized));
        }
        Self { codes, code_hashes }
    }
}

/// Normalize user input for hashing: drop separators, uppercase, and require
/// exactly eight hex characters.
#[must_use]
pub fn normalize_backup_code(input: &str) -> Option<String> {
    let normalized: String = input
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_uppercase())
        .collect();

    if normalized.len() != CODE_HEX_LEN {
        return None;
    }
    if !normalized
        .bytes()
        .all(|byte| byte.is_ascii_digit() || (b'A'..=b'F').contains(&byte))
    {
        return None;
    }
    Some(normalized)
}

/// Group a normalized code for display (`A1B2C3D4` becomes `A1B2-C3D4`).
#[must_use]
pub fn format_backup_code(normalized: &str) -> String {
    let mut out = String::with_capacity(CODE_HEX_LEN + 1);
    for (idx, chunk) in normalized.as_bytes().chunks(CODE_GROUP_SIZE).enumerate() {
        if idx > 0 {
            out.push('-');
        }
        out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
    }
    out
}

/// Digest of a normalized code, the only representation that touches the store.
#[must_use]
pub fn hash_backup_code(normalized: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hasher.finalize().to_vec()
}

fn generate_code<R: RngCore + ?Sized>(rng: &mut R) -> String {
    let mut raw = [0u8; CODE_HEX_LEN / 2];
    rng.fill_bytes(&mut raw);
    raw.iter().map(|byte| format!("{byte:02X}")).collect()
}
