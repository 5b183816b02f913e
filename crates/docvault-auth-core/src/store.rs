//! User storage
//!
//! The auth service only sees the [`UserStore`] trait so the in-memory
//! reference store can be swapped for a real database without touching the
//! operation contracts. Implementations must be safe for concurrent use.

use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use docvault_types::{Role, SubjectId, UserRecord};

/// Store of user records, keyed by id with an email index
pub trait UserStore: Send + Sync {
    /// Look up a user by normalized email
    fn find_by_email(&self, email: &str) -> Option<UserRecord>;

    /// Look up a user by subject ID
    fn find_by_id(&self, id: SubjectId) -> Option<UserRecord>;

    /// Create a user; fails (returning `None`) when the email is taken
    fn create(&self, email: &str, password_hash: &str, role: Role) -> Option<UserRecord>;

    /// Replace a user's password hash; returns false when the user is gone
    fn update_password_hash(&self, id: SubjectId, password_hash: &str) -> bool;
}

/// In-memory reference store
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<DashMap<Uuid, UserRecord>>,
    by_email: Arc<DashMap<String, Uuid>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserStore for InMemoryUserStore {
    fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        self.by_email
            .get(email)
            .and_then(|id| self.users.get(id.value()).map(|r| r.value().clone()))
    }

    fn find_by_id(&self, id: SubjectId) -> Option<UserRecord> {
        self.users.get(&id.0).map(|r| r.value().clone())
    }

    fn create(&self, email: &str, password_hash: &str, role: Role) -> Option<UserRecord> {
        let record = UserRecord {
            id: SubjectId::new(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
        };

        // The email index entry is the uniqueness gate; entry() keeps the
        // check-and-insert atomic per email
        match self.by_email.entry(email.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => None,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record.id.0);
                self.users.insert(record.id.0, record.clone());
                Some(record)
            }
        }
    }

    fn update_password_hash(&self, id: SubjectId, password_hash: &str) -> bool {
        match self.users.get_mut(&id.0) {
            Some(mut user) => {
                user.password_hash = password_hash.to_string();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for InMemoryUserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryUserStore")
            .field("users", &self.users.len())
            .finish()
    }
}
