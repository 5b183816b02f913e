//! User identity types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique subject (user) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub Uuid);

impl SubjectId {
    /// Create a new random subject ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a subject ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for SubjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SubjectId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Role carried in session claims
///
/// Authorization beyond carrying this claim is out of scope; route
/// collaborators decide what each role may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Client => "client",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "client" => Ok(Self::Client),
            _ => Err(()),
        }
    }
}

/// Stored user record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Subject ID
    pub id: SubjectId,
    /// Email address (normalized: trimmed, lower-cased)
    pub email: String,
    /// Bcrypt password hash
    pub password_hash: String,
    /// Role claim carried into sessions
    pub role: Role,
}
