//! Configuration for the auth subsystem

use std::time::Duration;

use crate::rate_limit::RateLimitPolicy;
use crate::token::DEFAULT_LEEWAY_SECS;

/// Name of the http-only session cookie
pub const SESSION_COOKIE: &str = "docvault_session";

/// Auth subsystem configuration.
///
/// Issuer and audience are fixed per deployment; signing secrets arrive
/// separately through [`crate::KeyManager`]. Rate-limit constants are
/// per-route policy knobs, not behavior.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Token issuer claim
    pub issuer: String,
    /// Token audience claim
    pub audience: String,
    /// Session token lifetime (default: 2 hours)
    pub session_ttl: Duration,
    /// Password-reset token lifetime (default: 15 minutes)
    pub reset_ttl: Duration,
    /// Clock-skew tolerance for token verification, seconds
    pub clock_skew_secs: u64,
    /// Rate-limit policy for the login route
    pub login_limits: RateLimitPolicy,
    /// Rate-limit policy for the register route
    pub register_limits: RateLimitPolicy,
    /// Rate-limit policy for the forgot-password route
    pub forgot_limits: RateLimitPolicy,
    /// Bcrypt cost factor
    pub bcrypt_cost: u32,
    /// Server-side pepper appended to passwords before hashing
    pub pepper: String,
    /// Production mode: cookies carry the Secure attribute
    pub production: bool,
    /// Dev-only diagnostic: log issued reset tokens. Must stay off in
    /// production-equivalent configurations; tokens never go into
    /// response bodies either way.
    pub log_reset_tokens: bool,
}

impl AuthConfig {
    /// Create a config with deployment-fixed issuer/audience and defaults
    /// for everything else
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            session_ttl: Duration::from_secs(2 * 60 * 60),
            reset_ttl: Duration::from_secs(15 * 60),
            clock_skew_secs: DEFAULT_LEEWAY_SECS,
            login_limits: RateLimitPolicy::default(),
            register_limits: RateLimitPolicy::default(),
            forgot_limits: RateLimitPolicy::default(),
            bcrypt_cost: crate::password::DEFAULT_BCRYPT_COST,
            pepper: String::new(),
            production: false,
            log_reset_tokens: false,
        }
    }

    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_reset_ttl(mut self, ttl: Duration) -> Self {
        self.reset_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_login_limits(mut self, policy: RateLimitPolicy) -> Self {
        self.login_limits = policy;
        self
    }

    #[must_use]
    pub fn with_register_limits(mut self, policy: RateLimitPolicy) -> Self {
        self.register_limits = policy;
        self
    }

    #[must_use]
    pub fn with_forgot_limits(mut self, policy: RateLimitPolicy) -> Self {
        self.forgot_limits = policy;
        self
    }

    #[must_use]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    #[must_use]
    pub fn with_pepper(mut self, pepper: impl Into<String>) -> Self {
        self.pepper = pepper.into();
        self
    }

    #[must_use]
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    #[must_use]
    pub fn with_log_reset_tokens(mut self, log: bool) -> Self {
        self.log_reset_tokens = log;
        self
    }

    /// Render the Set-Cookie value carrying a session token
    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{SESSION_COOKIE}={token}; HttpOnly;{} SameSite=Lax; Path=/; Max-Age={}",
            self.secure_attr(),
            self.session_ttl.as_secs()
        )
    }

    /// Render the Set-Cookie value clearing the session cookie
    pub fn clear_session_cookie(&self) -> String {
        format!(
            "{SESSION_COOKIE}=; HttpOnly;{} SameSite=Lax; Path=/; Max-Age=0",
            self.secure_attr()
        )
    }

    /// Render the Set-Cookie value for a CSRF token.
    ///
    /// Deliberately not HttpOnly: client script must read it back into the
    /// request header.
    pub fn csrf_cookie(&self, token: &str) -> String {
        format!(
            "{}={token};{} SameSite=Lax; Path=/; Max-Age={}",
            crate::csrf::CSRF_COOKIE,
            self.secure_attr(),
            self.session_ttl.as_secs()
        )
    }

    fn secure_attr(&self) -> &'static str {
        if self.production {
            " Secure;"
        } else {
            ""
        }
    }
}
