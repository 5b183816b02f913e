//! Double-submit CSRF defense
//!
//! A random token is placed in a script-readable cookie; the client
//! mirrors it into a request header on every state-changing request.
//! Validation requires both values present and equal under constant-time
//! comparison - absence of either is a failure, never an automatic pass.
//! GET requests may be checked for consistency but must never be the sole
//! gate for a mutation.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};

use crate::crypto::constant_time_str_eq;
use crate::AuthError;

/// Name of the script-readable CSRF cookie
pub const CSRF_COOKIE: &str = "docvault_csrf";
/// Name of the request header the client mirrors the cookie into
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Default token entropy in bytes (well above the 16-byte minimum)
pub const TOKEN_BYTES: usize = 32;

/// Anti-CSRF token generator and validator
#[derive(Debug, Clone, Copy, Default)]
pub struct CsrfGuard;

impl CsrfGuard {
    pub fn new() -> Self {
        Self
    }

    /// Generate a fresh URL-safe random token
    pub fn issue_token(&self) -> String {
        let mut buf = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut buf);
        URL_SAFE_NO_PAD.encode(buf)
    }

    /// Validate a double-submit pair.
    ///
    /// # Errors
    /// [`AuthError::CsrfInvalid`] when either value is missing or the two
    /// differ.
    pub fn validate(&self, cookie: Option<&str>, header: Option<&str>) -> Result<(), AuthError> {
        let (cookie, header) = match (cookie, header) {
            (Some(c), Some(h)) if !c.is_empty() && !h.is_empty() => (c, h),
            _ => return Err(AuthError::CsrfInvalid),
        };

        if constant_time_str_eq(cookie, header) {
            Ok(())
        } else {
            Err(AuthError::CsrfInvalid)
        }
    }
}
