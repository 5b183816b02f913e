//! Docvault Auth Core - Authentication and session security
//!
//! Core authentication functionality for the docvault document portal:
//! signed session tokens with key rotation, a revocation registry backing
//! "log out everywhere," double-submit CSRF defense, windowed rate limiting
//! with temporary blocking, and single-use password-reset tokens.
//!
//! Route handlers are external collaborators: they validate CSRF, consult
//! the rate limiter, and call [`AuthService`] operations. Nothing here
//! performs I/O beyond reading configuration from the environment.

pub mod config;
pub mod crypto;
pub mod csrf;
pub mod error;
pub mod keys;
pub mod password;
pub mod rate_limit;
pub mod reset;
pub mod revocation;
pub mod service;
pub mod session;
pub mod store;
pub mod token;

pub use config::{AuthConfig, SESSION_COOKIE};
pub use crypto::{constant_time_eq, constant_time_str_eq};
pub use csrf::{CsrfGuard, CSRF_COOKIE, CSRF_HEADER};
pub use error::AuthError;
pub use keys::KeyManager;
pub use rate_limit::{RateLimitPolicy, RateLimitStatus, RateLimiter};
pub use reset::ResetTokenService;
pub use revocation::RevocationRegistry;
pub use service::{timing_jitter_delay, AuthService, LoginOutcome, ResetIssue};
pub use session::SessionService;
pub use store::{InMemoryUserStore, UserStore};
pub use token::TokenCodec;
