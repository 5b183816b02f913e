//! Session and reset-token types

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Role, SubjectId};

/// Token `typ` discriminator for session tokens
pub const TOKEN_TYPE_SESSION: &str = "session";
/// Token `typ` discriminator for password-reset tokens
pub const TOKEN_TYPE_RESET: &str = "pwd_reset";

/// Unique session identifier (the `jti` of a session token)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a session ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Unique reset-token identifier (the `jti` of a reset token)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResetId(pub Uuid);

impl ResetId {
    /// Create a new random reset ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a reset ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ResetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ResetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ResetId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Claims carried by a signed session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user) ID
    pub sub: SubjectId,
    /// Role claim
    pub role: Role,
    /// Email address
    pub email: String,
    /// Unique session ID, registered with the revocation registry
    pub jti: SessionId,
    /// Issued-at (Unix seconds)
    pub iat: i64,
    /// Not-before (Unix seconds)
    pub nbf: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Token type discriminator (always "session")
    pub typ: String,
}

impl SessionClaims {
    /// Check if the claims are expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Claims carried by a signed password-reset token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetClaims {
    /// Subject (user) ID
    pub sub: SubjectId,
    /// Email address the reset was requested for
    pub email: String,
    /// Single-use reset ID
    pub jti: ResetId,
    /// Issued-at (Unix seconds)
    pub iat: i64,
    /// Not-before (Unix seconds)
    pub nbf: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Token type discriminator (always "pwd_reset")
    pub typ: String,
}

impl ResetClaims {
    /// Check if the claims are expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Verified identity extracted from a live session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Subject (user) ID
    pub subject_id: SubjectId,
    /// Role claim
    pub role: Role,
    /// Email address
    pub email: String,
    /// Session ID, usable for single-session logout
    pub session_id: SessionId,
}
