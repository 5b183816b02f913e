//! Password-reset tokens
//!
//! Reset tokens are short-lived signed tokens carrying a single-use `jti`.
//! Consumption is tracked by id, not by token text, so the same id can
//! never be redeemed twice even if the token is replayed. Consumed ids
//! only need to outlive the token TTL; the in-memory set is bounded by
//! reset volume within that window.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashSet;
use uuid::Uuid;

use docvault_types::{ResetClaims, ResetId, SubjectId, TOKEN_TYPE_RESET};

use crate::token::TokenCodec;
use crate::AuthError;

/// Issues, verifies, and consumes password-reset tokens
#[derive(Clone)]
pub struct ResetTokenService {
    codec: Arc<TokenCodec>,
    ttl: Duration,
    consumed: Arc<DashSet<Uuid>>,
}

impl ResetTokenService {
    pub fn new(codec: Arc<TokenCodec>, ttl: Duration) -> Self {
        Self {
            codec,
            ttl,
            consumed: Arc::new(DashSet::new()),
        }
    }

    /// Issue a reset token for a subject
    pub fn issue(&self, subject: SubjectId, email: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = ResetClaims {
            sub: subject,
            email: email.to_string(),
            jti: ResetId::new(),
            iat: now,
            nbf: now,
            exp: now + self.ttl.as_secs() as i64,
            iss: self.codec.issuer().to_string(),
            aud: self.codec.audience().to_string(),
            typ: TOKEN_TYPE_RESET.to_string(),
        };
        self.codec.sign(&claims)
    }

    /// Verify a reset token.
    ///
    /// Checks signature, expiry, issuer, audience, and the `typ`
    /// discriminator; consumption is a separate check so the caller
    /// controls when the id is burned.
    ///
    /// # Errors
    /// [`AuthError::TokenInvalid`] for every rejection.
    pub fn verify(&self, token: &str) -> Result<ResetClaims, AuthError> {
        let claims: ResetClaims = self.codec.verify(token)?;
        if claims.typ != TOKEN_TYPE_RESET {
            tracing::debug!(typ = %claims.typ, "token type is not a reset");
            return Err(AuthError::TokenInvalid);
        }
        Ok(claims)
    }

    /// Whether this reset id has already been redeemed
    pub fn is_consumed(&self, id: ResetId) -> bool {
        self.consumed.contains(&id.0)
    }

    /// Burn a reset id so the token can never be redeemed again
    pub fn mark_consumed(&self, id: ResetId) {
        self.consumed.insert(id.0);
    }
}

impl std::fmt::Debug for ResetTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetTokenService")
            .field("ttl", &self.ttl)
            .field("consumed", &self.consumed.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyManager;

    fn service() -> ResetTokenService {
        let keys = Arc::new(KeyManager::new("v1", &"!".repeat(72), None).unwrap());
        let codec = Arc::new(TokenCodec::new(keys, "docvault", "docvault-web"));
        ResetTokenService::new(codec, Duration::from_secs(900))
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let resets = service();
        let subject = SubjectId::new();
        let token = resets.issue(subject, "a@x.com").unwrap();

        let claims = resets.verify(&token).unwrap();
        assert_eq!(claims.sub, subject);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.typ, TOKEN_TYPE_RESET);
        assert!(claims.exp - claims.iat == 900);
    }

    #[test]
    fn test_consumption_is_by_id() {
        let resets = service();
        let token = resets.issue(SubjectId::new(), "a@x.com").unwrap();
        let claims = resets.verify(&token).unwrap();

        assert!(!resets.is_consumed(claims.jti));
        resets.mark_consumed(claims.jti);
        assert!(resets.is_consumed(claims.jti));

        // The token still verifies cryptographically; consumption is the
        // caller's gate
        let replayed = resets.verify(&token).unwrap();
        assert!(resets.is_consumed(replayed.jti));
    }

    #[test]
    fn test_each_issue_gets_fresh_id() {
        let resets = service();
        let subject = SubjectId::new();
        let first = resets.verify(&resets.issue(subject, "a@x.com").unwrap()).unwrap();
        let second = resets.verify(&resets.issue(subject, "a@x.com").unwrap()).unwrap();
        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn test_session_token_rejected() {
        use docvault_types::{Role, SessionClaims, SessionId, TOKEN_TYPE_SESSION};

        let keys = Arc::new(KeyManager::new("v1", &"!".repeat(72), None).unwrap());
        let codec = Arc::new(TokenCodec::new(keys, "docvault", "docvault-web"));
        let resets = ResetTokenService::new(Arc::clone(&codec), Duration::from_secs(900));

        let now = Utc::now().timestamp();
        let session = SessionClaims {
            sub: SubjectId::new(),
            role: Role::Client,
            email: "a@x.com".to_string(),
            jti: SessionId::new(),
            iat: now,
            nbf: now,
            exp: now + 7200,
            iss: "docvault".to_string(),
            aud: "docvault-web".to_string(),
            typ: TOKEN_TYPE_SESSION.to_string(),
        };
        let token = codec.sign(&session).unwrap();
        assert!(matches!(resets.verify(&token), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = Arc::new(KeyManager::new("v1", &"!".repeat(72), None).unwrap());
        let codec = Arc::new(
            TokenCodec::new(keys, "docvault", "docvault-web").with_leeway(0),
        );
        let resets = ResetTokenService::new(Arc::clone(&codec), Duration::from_secs(900));

        let now = Utc::now().timestamp();
        let stale = ResetClaims {
            sub: SubjectId::new(),
            email: "a@x.com".to_string(),
            jti: ResetId::new(),
            iat: now - 1000,
            nbf: now - 1000,
            exp: now - 100,
            iss: "docvault".to_string(),
            aud: "docvault-web".to_string(),
            typ: TOKEN_TYPE_RESET.to_string(),
        };
        let token = codec.sign(&stale).unwrap();
        assert!(matches!(resets.verify(&token), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let resets = service();
        assert!(matches!(
            resets.verify("garbage"),
            Err(AuthError::TokenInvalid)
        ));
    }
}
