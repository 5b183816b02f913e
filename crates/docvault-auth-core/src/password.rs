//! Password hashing and complexity policy
//!
//! Bcrypt with an optional server-side pepper appended before hashing.
//! The 72-byte ceiling matches bcrypt's input limit.

use crate::AuthError;

/// Minimum password length in bytes
pub const MIN_PASSWORD_LEN: usize = 12;
/// Maximum password length in bytes (bcrypt input limit)
pub const MAX_PASSWORD_LEN: usize = 72;

/// Default bcrypt cost factor
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Enforce the password-complexity policy.
///
/// Requires 12-72 bytes with at least one uppercase letter, one lowercase
/// letter, one digit, and one symbol.
///
/// # Errors
/// [`AuthError::WeakPassword`] on any violation.
pub fn check_policy(password: &str) -> Result<(), AuthError> {
    let len = password.len();
    if len < MIN_PASSWORD_LEN || len > MAX_PASSWORD_LEN {
        return Err(AuthError::WeakPassword);
    }

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_ascii_alphanumeric());

    if has_lower && has_upper && has_digit && has_symbol {
        Ok(())
    } else {
        Err(AuthError::WeakPassword)
    }
}

/// Hash a password with bcrypt, appending the pepper first
pub fn hash_password(raw: &str, pepper: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(format!("{raw}{pepper}"), cost).map_err(|e| {
        tracing::error!("bcrypt hash failed: {e}");
        AuthError::Internal("failed to hash password".to_string())
    })
}

/// Verify a password against a stored hash.
///
/// Any error (malformed hash, empty hash) reads as a mismatch.
pub fn verify_password(raw: &str, pepper: &str, hash: &str) -> bool {
    if hash.is_empty() {
        return false;
    }
    bcrypt::verify(format!("{raw}{pepper}"), hash).unwrap_or(false)
}
