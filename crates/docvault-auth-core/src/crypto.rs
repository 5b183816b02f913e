//! Cryptographic utilities for secure comparisons
//!
//! Security-critical primitives that must be implemented correctly to
//! prevent timing attacks and other side-channel leaks. MAC computation
//! for tokens lives in the JWT codec; this module covers the comparisons
//! shared by the CSRF guard and tests.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Constant-time byte slice comparison.
///
/// The comparison time depends only on the length of the slices, not on
/// their contents.
///
/// # Security
/// - Returns `false` immediately if lengths differ (length is not secret)
/// - Compares all bytes even after finding a difference
#[inline]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Constant-time string comparison.
///
/// Wrapper around `constant_time_eq` for string comparisons.
#[inline]
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

/// One-way SHA-256 digest of a token, hex encoded.
///
/// Suitable for logging or indexing a token without storing it.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
