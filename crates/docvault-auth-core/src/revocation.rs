//! Session revocation registry
//!
//! Tracks which session IDs are live per subject plus a global revoked
//! set. A session is accepted only when it is present in its owner's live
//! set and absent from the revoked set; unknown subjects, unknown
//! sessions, and any other ambiguity answer "revoked" (fail closed). The
//! revoked set also covers sessions whose owning live set was already
//! cleared by a revoke-all.
//!
//! A single mutex guards both structures so `revoke_all` is atomic
//! relative to a concurrent `register` for the same subject.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use docvault_types::{SessionId, SubjectId};

#[derive(Default)]
struct RegistryState {
    live: HashMap<SubjectId, HashSet<SessionId>>,
    revoked: HashSet<SessionId>,
}

/// In-memory revocation registry
#[derive(Default)]
pub struct RevocationRegistry {
    state: Mutex<RegistryState>,
}

impl RevocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly issued session as live for its subject
    pub fn register(&self, subject: SubjectId, session: SessionId) {
        let mut state = self.lock();
        state.revoked.remove(&session);
        state.live.entry(subject).or_default().insert(session);
    }

    /// Revoke a single session.
    ///
    /// The session lands in the global revoked set and is pruned from any
    /// live set it appears in.
    pub fn revoke(&self, session: SessionId) {
        let mut state = self.lock();
        for sessions in state.live.values_mut() {
            sessions.remove(&session);
        }
        state.revoked.insert(session);
    }

    /// Revoke every live session for a subject ("log out everywhere").
    ///
    /// Moves the subject's live set into the revoked set and clears it.
    /// Returns how many sessions were revoked.
    pub fn revoke_all(&self, subject: SubjectId) -> usize {
        let mut state = self.lock();
        let sessions = state.live.remove(&subject).unwrap_or_default();
        let count = sessions.len();
        state.revoked.extend(sessions);
        if count > 0 {
            tracing::debug!(%subject, count, "revoked all sessions");
        }
        count
    }

    /// Whether a session should be treated as revoked.
    ///
    /// Fail closed: only a session that is live for this subject and not
    /// globally revoked is accepted.
    pub fn is_revoked(&self, subject: SubjectId, session: SessionId) -> bool {
        let state = self.lock();
        if state.revoked.contains(&session) {
            return true;
        }
        let live = state
            .live
            .get(&subject)
            .is_some_and(|sessions| sessions.contains(&session));
        !live
    }

    /// Number of live sessions currently registered for a subject
    pub fn live_count(&self, subject: SubjectId) -> usize {
        self.lock().live.get(&subject).map_or(0, HashSet::len)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryState> {
        // A poisoned lock means a panic while mutating shared auth state;
        // continuing with the recovered data keeps fail-closed semantics
        // (missing entries read as revoked).
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for RevocationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("RevocationRegistry")
            .field("subjects", &state.live.len())
            .field("revoked", &state.revoked.len())
            .finish()
    }
}
