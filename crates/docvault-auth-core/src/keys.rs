//! Signing-key management with rotation support
//!
//! Secrets are keyed by key-id (kid). Exactly one kid is current; at most
//! one previous key is retained under [`PREVIOUS_KID`] so tokens signed
//! before a rotation keep verifying until they expire. Every secret must
//! carry at least [`KeyManager::MIN_SECRET_BYTES`] bytes of entropy or
//! construction fails fatally - the system must not start with a weak or
//! missing key.

use std::collections::HashMap;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::AuthError;

/// Environment variable naming the current kid
pub const ENV_KID: &str = "DOCVAULT_JWT_KID";
/// Environment variable prefix for per-kid secrets
pub const ENV_SECRET_PREFIX: &str = "DOCVAULT_JWT_SECRET_";
/// Kid under which the single previous key is retained
pub const PREVIOUS_KID: &str = "old";

const DEFAULT_KID: &str = "current";

/// Signing-key set with a designated current kid
#[derive(Clone)]
pub struct KeyManager {
    keys: HashMap<String, Vec<u8>>,
    current: String,
}

impl KeyManager {
    /// Minimum decoded entropy per secret, in bytes
    pub const MIN_SECRET_BYTES: usize = 64;

    /// Create a key manager from explicit secrets.
    ///
    /// `previous`, when present, is retained under the kid
    /// [`PREVIOUS_KID`] for rotation overlap.
    ///
    /// # Errors
    /// Returns the fatal [`AuthError::KeyConfig`] if any secret is weak.
    pub fn new(
        current_kid: impl Into<String>,
        current_secret: &str,
        previous: Option<&str>,
    ) -> Result<Self, AuthError> {
        let current = current_kid.into();
        if current.is_empty() {
            return Err(AuthError::KeyConfig("current kid is empty".to_string()));
        }

        let mut keys = HashMap::new();
        assert_strong(&current, current_secret)?;
        keys.insert(current.clone(), current_secret.as_bytes().to_vec());

        if let Some(old) = previous {
            assert_strong(PREVIOUS_KID, old)?;
            keys.insert(PREVIOUS_KID.to_string(), old.as_bytes().to_vec());
        }

        Ok(Self { keys, current })
    }

    /// Load keys from the environment.
    ///
    /// Reads `DOCVAULT_JWT_KID` (defaulting to `current`), the matching
    /// `DOCVAULT_JWT_SECRET_<KID>`, and the optional
    /// `DOCVAULT_JWT_SECRET_old` rotation key.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load keys through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AuthError> {
        let kid = lookup(ENV_KID).unwrap_or_else(|| DEFAULT_KID.to_string());
        let var = format!("{ENV_SECRET_PREFIX}{kid}");
        let current = lookup(&var)
            .ok_or_else(|| AuthError::KeyConfig(format!("{var} is missing")))?;
        let previous = lookup(&format!("{ENV_SECRET_PREFIX}{PREVIOUS_KID}"));

        Self::new(kid, &current, previous.as_deref())
    }

    /// The kid used to sign new tokens
    pub fn current_kid(&self) -> &str {
        &self.current
    }

    /// Secret material for the current kid
    pub fn current_secret(&self) -> &[u8] {
        // Invariant: the current kid is always present after construction
        &self.keys[&self.current]
    }

    /// Look up a secret by kid.
    ///
    /// Unknown kids fail with the opaque [`AuthError::TokenInvalid`] so a
    /// verifier cannot leak which key-ids exist.
    pub fn secret_for(&self, kid: &str) -> Result<&[u8], AuthError> {
        self.keys.get(kid).map(Vec::as_slice).ok_or_else(|| {
            tracing::debug!(kid, "unknown key id");
            AuthError::TokenInvalid
        })
    }

    /// Whether a kid is configured
    pub fn has_kid(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }
}

impl std::fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManager")
            .field("current", &self.current)
            .field("kids", &self.keys.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Entropy of a configured secret, in bytes.
///
/// A base64url-shaped string is decoded first so a 86-char encoding of 64
/// random bytes passes while 86 chars of the alphabet "aaaa..." still get
/// measured by what they decode to. Anything else counts as raw UTF-8.
fn secret_entropy_bytes(value: &str) -> usize {
    let base64url_shaped =
        !value.is_empty() && value.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if base64url_shaped {
        if let Ok(decoded) = URL_SAFE_NO_PAD.decode(value) {
            return decoded.len();
        }
    }
    value.len()
}

fn assert_strong(name: &str, value: &str) -> Result<(), AuthError> {
    let bytes = secret_entropy_bytes(value);
    if bytes < KeyManager::MIN_SECRET_BYTES {
        return Err(AuthError::KeyConfig(format!(
            "secret for kid '{name}' too short: {bytes} bytes of entropy, need >= {}",
            KeyManager::MIN_SECRET_BYTES
        )));
    }
    Ok(())
}
