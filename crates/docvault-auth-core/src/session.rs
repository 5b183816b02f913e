//! Session issuance and verification
//!
//! A session is a signed token whose `jti` is registered with the
//! revocation registry at issue time. Verification is the only read path:
//! signature, expiry, issuer, audience, the `typ` discriminator, and
//! liveness in the registry must all hold, and every failure collapses to
//! [`AuthError::Unauthorized`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use docvault_types::{
    Role, SessionClaims, SessionId, SessionIdentity, SubjectId, TOKEN_TYPE_SESSION,
};

use crate::revocation::RevocationRegistry;
use crate::token::TokenCodec;
use crate::AuthError;

/// Issues and verifies session tokens
#[derive(Debug, Clone)]
pub struct SessionService {
    codec: Arc<TokenCodec>,
    registry: Arc<RevocationRegistry>,
    ttl: Duration,
}

impl SessionService {
    pub fn new(codec: Arc<TokenCodec>, registry: Arc<RevocationRegistry>, ttl: Duration) -> Self {
        Self {
            codec,
            registry,
            ttl,
        }
    }

    /// Issue a session token for an authenticated subject.
    ///
    /// The fresh session ID is registered as live before the token is
    /// returned, so the token is immediately verifiable.
    pub fn issue(
        &self,
        subject: SubjectId,
        role: Role,
        email: &str,
    ) -> Result<(SessionId, String), AuthError> {
        let session_id = SessionId::new();
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: subject,
            role,
            email: email.to_string(),
            jti: session_id,
            iat: now,
            nbf: now,
            exp: now + self.ttl.as_secs() as i64,
            iss: self.codec.issuer().to_string(),
            aud: self.codec.audience().to_string(),
            typ: TOKEN_TYPE_SESSION.to_string(),
        };

        let token = self.codec.sign(&claims)?;
        self.registry.register(subject, session_id);
        tracing::debug!(%subject, session = %session_id, "issued session");
        Ok((session_id, token))
    }

    /// Verify a session token and return the identity it carries.
    ///
    /// # Errors
    /// [`AuthError::Unauthorized`] for every rejection; the caller learns
    /// nothing about which check failed.
    pub fn verify(&self, token: &str) -> Result<SessionIdentity, AuthError> {
        let claims: SessionClaims = self
            .codec
            .verify(token)
            .map_err(|_| AuthError::Unauthorized)?;

        if claims.typ != TOKEN_TYPE_SESSION {
            tracing::debug!(typ = %claims.typ, "token type is not a session");
            return Err(AuthError::Unauthorized);
        }

        if self.registry.is_revoked(claims.sub, claims.jti) {
            tracing::debug!(subject = %claims.sub, session = %claims.jti, "session revoked");
            return Err(AuthError::Unauthorized);
        }

        Ok(SessionIdentity {
            subject_id: claims.sub,
            role: claims.role,
            email: claims.email,
            session_id: claims.jti,
        })
    }

    pub fn registry(&self) -> &RevocationRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyManager;

    fn service() -> SessionService {
        let keys = Arc::new(KeyManager::new("v1", &"!".repeat(72), None).unwrap());
        let codec = Arc::new(TokenCodec::new(keys, "docvault", "docvault-web"));
        SessionService::new(
            codec,
            Arc::new(RevocationRegistry::new()),
            Duration::from_secs(7200),
        )
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let sessions = service();
        let subject = SubjectId::new();
        let (session_id, token) = sessions.issue(subject, Role::Manager, "m@x.com").unwrap();

        let identity = sessions.verify(&token).unwrap();
        assert_eq!(identity.subject_id, subject);
        assert_eq!(identity.role, Role::Manager);
        assert_eq!(identity.email, "m@x.com");
        assert_eq!(identity.session_id, session_id);
    }

    #[test]
    fn test_revoked_session_rejected() {
        let sessions = service();
        let subject = SubjectId::new();
        let (session_id, token) = sessions.issue(subject, Role::Client, "c@x.com").unwrap();

        sessions.registry().revoke(session_id);
        assert!(matches!(
            sessions.verify(&token),
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn test_revoke_all_rejects_every_session() {
        let sessions = service();
        let subject = SubjectId::new();
        let (_, first) = sessions.issue(subject, Role::Client, "c@x.com").unwrap();
        let (_, second) = sessions.issue(subject, Role::Client, "c@x.com").unwrap();

        assert_eq!(sessions.registry().revoke_all(subject), 2);
        assert!(sessions.verify(&first).is_err());
        assert!(sessions.verify(&second).is_err());
    }

    #[test]
    fn test_unregistered_token_rejected() {
        // A validly signed token whose jti was never registered must fail
        // closed
        let keys = Arc::new(KeyManager::new("v1", &"!".repeat(72), None).unwrap());
        let codec = Arc::new(TokenCodec::new(keys, "docvault", "docvault-web"));
        let signer = SessionService::new(
            Arc::clone(&codec),
            Arc::new(RevocationRegistry::new()),
            Duration::from_secs(7200),
        );
        let verifier =
            SessionService::new(codec, Arc::new(RevocationRegistry::new()), Duration::from_secs(7200));

        let (_, token) = signer.issue(SubjectId::new(), Role::Client, "c@x.com").unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn test_wrong_token_type_rejected() {
        use docvault_types::{ResetClaims, ResetId, TOKEN_TYPE_RESET};

        let keys = Arc::new(KeyManager::new("v1", &"!".repeat(72), None).unwrap());
        let codec = Arc::new(TokenCodec::new(keys, "docvault", "docvault-web"));
        let sessions = SessionService::new(
            Arc::clone(&codec),
            Arc::new(RevocationRegistry::new()),
            Duration::from_secs(7200),
        );

        let now = Utc::now().timestamp();
        let reset = ResetClaims {
            sub: SubjectId::new(),
            email: "c@x.com".to_string(),
            jti: ResetId::new(),
            iat: now,
            nbf: now,
            exp: now + 900,
            iss: "docvault".to_string(),
            aud: "docvault-web".to_string(),
            typ: TOKEN_TYPE_RESET.to_string(),
        };
        let token = codec.sign(&reset).unwrap();
        assert!(matches!(
            sessions.verify(&token),
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let sessions = service();
        assert!(matches!(
            sessions.verify("not-a-token"),
            Err(AuthError::Unauthorized)
        ));
    }
}
