//! Generic signed-token codec
//!
//! Signs and verifies claims as HS512 compact JWTs. The protected header
//! carries the signing kid so verification selects the matching secret
//! during key rotation without guessing. Every verification failure -
//! parse error, bad signature, expiry, not-before, issuer, audience,
//! unknown kid - collapses to the single opaque
//! [`AuthError::TokenInvalid`]; the `typ` discriminator is enforced by the
//! calling service.

use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use crate::{AuthError, KeyManager};

/// Default clock-skew tolerance for verification, in seconds
pub const DEFAULT_LEEWAY_SECS: u64 = 60;

const ALG: Algorithm = Algorithm::HS512;

/// Keyed-MAC token codec shared by session and reset tokens
#[derive(Clone)]
pub struct TokenCodec {
    keys: Arc<KeyManager>,
    issuer: String,
    audience: String,
    leeway_secs: u64,
}

impl TokenCodec {
    /// Create a codec bound to a key set and a fixed issuer/audience pair
    pub fn new(keys: Arc<KeyManager>, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            audience: audience.into(),
            leeway_secs: DEFAULT_LEEWAY_SECS,
        }
    }

    /// Override the clock-skew tolerance
    #[must_use]
    pub fn with_leeway(mut self, secs: u64) -> Self {
        self.leeway_secs = secs;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Sign claims under the current key.
    ///
    /// The claims struct is expected to carry `iat`, `nbf`, `exp`, `iss`,
    /// `aud`, and `typ`; the codec only attaches the protected header
    /// `{alg, kid}` and computes the MAC.
    pub fn sign<C: Serialize>(&self, claims: &C) -> Result<String, AuthError> {
        let mut header = Header::new(ALG);
        header.kid = Some(self.keys.current_kid().to_string());

        encode(&header, claims, &EncodingKey::from_secret(self.keys.current_secret())).map_err(
            |e| {
                tracing::error!("failed to sign token: {e}");
                AuthError::Internal("failed to sign token".to_string())
            },
        )
    }

    /// Verify a token and deserialize its claims.
    ///
    /// The secret is resolved through the header kid, falling back to the
    /// current key when the header carries none. Signature comparison is
    /// constant time inside the JWT library; expiry, not-before, issuer,
    /// and audience are all checked with the configured leeway.
    pub fn verify<C: DeserializeOwned>(&self, token: &str) -> Result<C, AuthError> {
        let header = decode_header(token).map_err(|e| {
            tracing::debug!("failed to decode token header: {e}");
            AuthError::TokenInvalid
        })?;

        let secret = match header.kid.as_deref() {
            Some(kid) => self.keys.secret_for(kid)?,
            None => self.keys.current_secret(),
        };

        let mut validation = Validation::new(ALG);
        validation.leeway = self.leeway_secs;
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud"]);

        decode::<C>(token, &DecodingKey::from_secret(secret), &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("token rejected: {e}");
                AuthError::TokenInvalid
            })
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_secs", &self.leeway_secs)
            .finish_non_exhaustive()
    }
}
