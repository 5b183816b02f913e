//! Auth errors
//!
//! Boundary messages are deliberately low-information ("invalid
//! credentials", "invalid or expired token") so callers cannot enumerate
//! accounts or distinguish which verification step failed. Only
//! [`AuthError::RateLimited`] carries a machine-readable hint.

use thiserror::Error;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing, invalid, expired, or revoked session; or bad credentials
    #[error("unauthorized")]
    Unauthorized,

    /// Missing or mismatched CSRF token pair
    #[error("invalid CSRF token")]
    CsrfInvalid,

    /// Too many attempts; retry after the given number of seconds
    #[error("too many attempts, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Password policy violation
    #[error("weak password: use at least 12 characters with upper, lower, digit, and symbol")]
    WeakPassword,

    /// Malformed, expired, wrong-type, or already-consumed token
    #[error("invalid or expired token")]
    TokenInvalid,

    /// Generic registration failure (covers duplicate email without
    /// revealing account existence)
    #[error("registration failed")]
    RegistrationFailed,

    /// Fatal signing-key configuration problem; must abort startup
    #[error("key configuration error: {0}")]
    KeyConfig(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized | Self::TokenInvalid => 401,
            Self::CsrfInvalid => 403,
            Self::RateLimited { .. } => 429,
            Self::WeakPassword | Self::RegistrationFailed => 400,
            Self::KeyConfig(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::CsrfInvalid => "CSRF_INVALID",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::WeakPassword => "WEAK_PASSWORD",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::RegistrationFailed => "REGISTRATION_FAILED",
            Self::KeyConfig(_) => "KEY_CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Retry-After seconds, if this error carries one
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}
