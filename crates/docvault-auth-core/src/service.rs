//! Auth service - ties together credentials, sessions, resets, rate
//! limiting, and CSRF
//!
//! One instance owns the whole auth state for a process. Operations map
//! one-to-one onto the portal's auth routes; the outer transport layer
//! only parses requests, calls one operation, and renders the result.
//! Failures reuse the opaque [`AuthError`] kinds so responses never leak
//! whether an account exists or which verification step failed.

use std::sync::Arc;
use std::time::Duration;

use docvault_types::{Role, SessionId, SessionIdentity, SubjectId};

use crate::{
    config::AuthConfig,
    csrf::CsrfGuard,
    password,
    rate_limit::{RateLimitStatus, RateLimiter},
    reset::ResetTokenService,
    revocation::RevocationRegistry,
    session::SessionService,
    store::UserStore,
    token::TokenCodec,
    AuthError, KeyManager,
};

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Signed session token, destined for the session cookie
    pub token: String,
    /// Identity carried by the new session
    pub identity: SessionIdentity,
}

/// A reset token issued for an existing account.
///
/// `forgot_password` returns `None` for unknown emails; the caller must
/// respond identically either way and deliver the token out of band.
#[derive(Debug, Clone)]
pub struct ResetIssue {
    /// The account's stored email
    pub email: String,
    /// Signed single-use reset token
    pub token: String,
}

/// Authentication service
///
/// Provides a unified interface for:
/// - Credential login and registration
/// - Session issuance, verification, and revocation
/// - Password reset and change flows
/// - Per-route rate limiting and CSRF validation
pub struct AuthService<U: UserStore> {
    config: AuthConfig,
    users: Arc<U>,
    registry: Arc<RevocationRegistry>,
    sessions: SessionService,
    resets: ResetTokenService,
    limiter: RateLimiter,
    csrf: CsrfGuard,
}

impl<U: UserStore> AuthService<U> {
    /// Create a new auth service
    pub fn new(config: AuthConfig, keys: KeyManager, users: Arc<U>) -> Self {
        let codec = Arc::new(
            TokenCodec::new(Arc::new(keys), &config.issuer, &config.audience)
                .with_leeway(config.clock_skew_secs),
        );
        let registry = Arc::new(RevocationRegistry::new());

        Self {
            sessions: SessionService::new(
                Arc::clone(&codec),
                Arc::clone(&registry),
                config.session_ttl,
            ),
            resets: ResetTokenService::new(codec, config.reset_ttl),
            limiter: RateLimiter::new(),
            csrf: CsrfGuard::new(),
            registry,
            users,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn csrf(&self) -> &CsrfGuard {
        &self.csrf
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn revocations(&self) -> &RevocationRegistry {
        &self.registry
    }

    // =========================================================================
    // Login / Registration
    // =========================================================================

    /// Authenticate credentials and open a session.
    ///
    /// Bad email and bad password are indistinguishable to the caller.
    /// Failed attempts count against the `ip|email|login` bucket; a
    /// successful login clears it.
    pub fn login(
        &self,
        email: &str,
        password: &str,
        client_ip: &str,
    ) -> Result<LoginOutcome, AuthError> {
        let email = normalize_email(email);
        let key = RateLimiter::key([client_ip, email.as_str(), "login"]);

        if let RateLimitStatus::Blocked { retry_after_secs } = self.limiter.is_blocked(&key) {
            return Err(AuthError::RateLimited { retry_after_secs });
        }

        let Some(user) = self.users.find_by_email(&email) else {
            self.limiter.bump_failure(&key, &self.config.login_limits);
            tracing::debug!(%email, "login rejected: unknown email");
            return Err(AuthError::Unauthorized);
        };

        if !password::verify_password(password, &self.config.pepper, &user.password_hash) {
            self.limiter.bump_failure(&key, &self.config.login_limits);
            tracing::debug!(%email, "login rejected: bad password");
            return Err(AuthError::Unauthorized);
        }

        self.limiter.reset(&key);
        let (session_id, token) = self.sessions.issue(user.id, user.role, &user.email)?;
        tracing::info!(subject = %user.id, "login succeeded");

        Ok(LoginOutcome {
            token,
            identity: SessionIdentity {
                subject_id: user.id,
                role: user.role,
                email: user.email,
                session_id,
            },
        })
    }

    /// Register a new account with the `client` role.
    ///
    /// A taken email reports the same generic [`AuthError::RegistrationFailed`]
    /// as any other rejection, so registration cannot be used to probe for
    /// accounts. Failures count against the `ip|email|register` bucket.
    /// Elevated roles are seeded through the store, never through this
    /// surface.
    pub fn register(
        &self,
        email: &str,
        password: &str,
        client_ip: &str,
    ) -> Result<SubjectId, AuthError> {
        let email = normalize_email(email);
        let key = RateLimiter::key([client_ip, email.as_str(), "register"]);

        if let RateLimitStatus::Blocked { retry_after_secs } = self.limiter.is_blocked(&key) {
            return Err(AuthError::RateLimited { retry_after_secs });
        }

        if let Err(e) = password::check_policy(password) {
            self.limiter.bump_failure(&key, &self.config.register_limits);
            return Err(e);
        }

        let hash = password::hash_password(password, &self.config.pepper, self.config.bcrypt_cost)?;
        let Some(user) = self.users.create(&email, &hash, Role::Client) else {
            self.limiter.bump_failure(&key, &self.config.register_limits);
            tracing::debug!(%email, "registration rejected: email taken");
            return Err(AuthError::RegistrationFailed);
        };

        self.limiter.reset(&key);
        tracing::info!(subject = %user.id, "account registered");
        Ok(user.id)
    }

    // =========================================================================
    // Password Reset
    // =========================================================================

    /// Start a password reset.
    ///
    /// Returns `Ok(None)` for unknown emails; every call counts against
    /// the `ip|email|forgot` bucket so the route cannot be used to probe
    /// or to mass-issue tokens. The token goes to the delivery channel
    /// only, never into a response body.
    pub fn forgot_password(
        &self,
        email: &str,
        client_ip: &str,
    ) -> Result<Option<ResetIssue>, AuthError> {
        let email = normalize_email(email);
        let key = RateLimiter::key([client_ip, email.as_str(), "forgot"]);

        if let RateLimitStatus::Blocked { retry_after_secs } = self.limiter.is_blocked(&key) {
            return Err(AuthError::RateLimited { retry_after_secs });
        }

        let issued = self.users.find_by_email(&email).map(|user| {
            self.resets
                .issue(user.id, &user.email)
                .map(|token| ResetIssue {
                    email: user.email,
                    token,
                })
        });
        // Requests for unknown emails consume an attempt too
        self.limiter.bump_failure(&key, &self.config.forgot_limits);

        let issued = issued.transpose()?;
        if let Some(issue) = &issued {
            if self.config.log_reset_tokens {
                // Dev-only diagnostic, gated off by default
                tracing::warn!(email = %issue.email, token = %issue.token, "issued reset token");
            } else {
                // Hash lets a reset be correlated with delivery logs
                // without the log ever holding the redeemable token
                tracing::info!(
                    email = %issue.email,
                    token_hash = %crate::crypto::hash_token(&issue.token),
                    "issued reset token"
                );
            }
        }
        Ok(issued)
    }

    /// Complete a password reset.
    ///
    /// The reset id is burned exactly once, whether or not the account
    /// still exists, and every live session for the subject is revoked.
    pub fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let claims = self.resets.verify(token)?;
        if self.resets.is_consumed(claims.jti) {
            tracing::debug!(reset = %claims.jti, "reset token already consumed");
            return Err(AuthError::TokenInvalid);
        }

        // Policy rejection leaves the token redeemable for a retry
        password::check_policy(new_password)?;

        let Some(user) = self.users.find_by_id(claims.sub) else {
            self.resets.mark_consumed(claims.jti);
            return Err(AuthError::TokenInvalid);
        };

        let hash =
            password::hash_password(new_password, &self.config.pepper, self.config.bcrypt_cost)?;
        if !self.users.update_password_hash(user.id, &hash) {
            self.resets.mark_consumed(claims.jti);
            return Err(AuthError::TokenInvalid);
        }

        self.resets.mark_consumed(claims.jti);
        let revoked = self.registry.revoke_all(user.id);
        tracing::info!(subject = %user.id, revoked, "password reset completed");
        Ok(())
    }

    /// Change the password of a logged-in user.
    ///
    /// Requires the current password; on success every live session for
    /// the subject is revoked, including the one that made the request.
    pub fn change_password(
        &self,
        session_token: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<SubjectId, AuthError> {
        let identity = self.sessions.verify(session_token)?;
        let user = self
            .users
            .find_by_id(identity.subject_id)
            .ok_or(AuthError::Unauthorized)?;

        if !password::verify_password(old_password, &self.config.pepper, &user.password_hash) {
            tracing::debug!(subject = %user.id, "change rejected: bad current password");
            return Err(AuthError::Unauthorized);
        }

        password::check_policy(new_password)?;
        let hash =
            password::hash_password(new_password, &self.config.pepper, self.config.bcrypt_cost)?;
        if !self.users.update_password_hash(user.id, &hash) {
            return Err(AuthError::Unauthorized);
        }

        let revoked = self.registry.revoke_all(user.id);
        tracing::info!(subject = %user.id, revoked, "password changed");
        Ok(user.id)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Verify a session token and return its identity
    pub fn verify_session(&self, token: &str) -> Result<SessionIdentity, AuthError> {
        self.sessions.verify(token)
    }

    /// Log out one session.
    ///
    /// Idempotent: revoking an already-dead session is a no-op, matching
    /// the always-clear-the-cookie behavior of the logout route. Callers
    /// obtain the session id from [`Self::verify_session`].
    pub fn logout(&self, session: SessionId) {
        self.registry.revoke(session);
        tracing::info!(%session, "logged out");
    }

    /// Log out every session for a subject ("log out everywhere")
    pub fn logout_all(&self, subject: SubjectId) -> usize {
        let revoked = self.registry.revoke_all(subject);
        tracing::info!(%subject, revoked, "logged out everywhere");
        revoked
    }
}

impl<U: UserStore> std::fmt::Debug for AuthService<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Sleep a random duration inside `[min_ms, max_ms]`.
///
/// Auth routes call this before responding to failures so response timing
/// does not betray which internal step rejected the request.
pub fn timing_jitter_delay(min_ms: u64, max_ms: u64) {
    use rand::Rng;
    let ms = rand::thread_rng().gen_range(min_ms..=max_ms.max(min_ms));
    std::thread::sleep(Duration::from_millis(ms));
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
