//! # Hashing Utilities
//!
//! The two hash functions the exchange knows about:
//!
//! - **SHA-256** — the default for credentials, and the only thing older
//!   wallet records know (they store a bare unsalted SHA-256 hex digest).
//!
//! - **BLAKE3** — the faster alternative. Selectable for new credentials via
//!   [`HashScheme`](super::credential::HashScheme).
//!
//! Both take their input as a list of parts so that salt and secret never
//! need to be concatenated into a temporary buffer.

use sha2::{Digest, Sha256};

/// SHA-256 over the concatenation of `parts`.
pub fn sha256_parts(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// BLAKE3 over the concatenation of `parts`.
pub fn blake3_parts(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

/// Compares two digests without short-circuiting on the first mismatch.
pub fn digests_match(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
