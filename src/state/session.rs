//! Session store: the single source of truth for who is logged in.
//!
//! SYSTEM CONTEXT
//! ==============
//! The guarded HTTP client reads the credential from here on every request
//! and clears the store when the server rejects it. The auth controller is
//! the only other writer.
//!
//! DESIGN
//! ======
//! State is one `SessionSnapshot` value behind a lock and is always replaced
//! whole, so readers never see an identity without its credential. Durable
//! storage is written before the in-memory swap is published, and storage
//! failures are logged rather than surfaced: the running process keeps
//! working from memory. Storage calls are synchronous and made under the
//! write lock, which is never held across an `.await`.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, RwLock};

use super::storage::{Storage, TOKEN_KEY, USER_KEY};
use crate::net::types::{Identity, Role};

// =============================================================================
// SESSION
// =============================================================================

/// An authenticated admin identity paired with its bearer credential.
///
/// Only constructible through [`Session::new`], which refuses partial data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    identity: Identity,
    credential: String,
}

impl Session {
    /// Pair an identity with a credential. Returns `None` if any field is empty.
    #[must_use]
    pub fn new(identity: Identity, credential: impl Into<String>) -> Option<Self> {
        let credential = credential.into();
        if credential.trim().is_empty() || identity.id.is_empty() || identity.username.is_empty() {
            return None;
        }
        Some(Self { identity, credential })
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.identity.id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.identity.username
    }

    #[must_use]
    pub fn role(&self) -> &Role {
        &self.identity.role
    }

    #[must_use]
    pub fn credential(&self) -> &str {
        &self.credential
    }
}

/// Consistent copy of the store at one instant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// True until the startup restore has finished.
    pub loading: bool,
    pub session: Option<Session>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn role(&self) -> Option<&Role> {
        self.session.as_ref().map(Session::role)
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Store internals: the published snapshot plus restore bookkeeping.
#[derive(Debug)]
struct StoreState {
    snapshot: SessionSnapshot,
    /// Set when the session is cleared while the restore is still running, so
    /// the restore cannot bring back a session the user just ended.
    restore_cancelled: bool,
}

pub struct SessionStore {
    state: RwLock<StoreState>,
    storage: Arc<dyn Storage>,
}

impl SessionStore {
    /// Create a store in the `Loading` state.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let snapshot = SessionSnapshot { loading: true, session: None };
        Self { state: RwLock::new(StoreState { snapshot, restore_cancelled: false }), storage }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .snapshot
            .clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .snapshot
            .loading
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .snapshot
            .is_authenticated()
    }

    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.snapshot().session
    }

    /// Bearer credential for outbound requests, if a session is active.
    #[must_use]
    pub fn credential(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .snapshot
            .session
            .as_ref()
            .map(|s| s.credential.clone())
    }

    /// Read the persisted pair. Both keys must be present and the identity
    /// must parse; anything less counts as no persisted session.
    #[must_use]
    pub fn load_persisted(&self) -> Option<Session> {
        let user = self.read_key(USER_KEY)?;
        let token = self.read_key(TOKEN_KEY)?;
        let identity = match serde_json::from_str::<Identity>(&user) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "persisted admin identity unreadable");
                return None;
            }
        };
        Session::new(identity, token)
    }

    /// Make `session` the active session, in memory and on disk.
    pub fn establish(&self, session: Session) {
        let mut state = self.state.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        self.persist(&session);
        tracing::info!(user_id = session.user_id(), username = session.username(), "session established");
        state.snapshot.session = Some(session);
    }

    /// Drop the active session and erase persisted data. Idempotent.
    ///
    /// While the startup restore is still running this also cancels it.
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        self.clear_locked(&mut state);
    }

    /// Clear only if `rejected` is still the credential in force.
    ///
    /// A rejection of some other credential (a stale persisted token, or the
    /// token a newer login replaced) leaves the current session alone. With
    /// no session active there is nothing to protect, so the store is cleared.
    /// Returns whether the store was cleared.
    pub fn clear_if_current(&self, rejected: Option<&str>) -> bool {
        let mut state = self.state.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let current = state.snapshot.session.as_ref().map(Session::credential);
        if current.is_some() && current != rejected {
            tracing::debug!("rejected credential is no longer current; keeping session");
            return false;
        }
        self.clear_locked(&mut state);
        true
    }

    /// Apply the outcome of the startup restore and leave `Loading`.
    ///
    /// A session established by a login that raced the restore wins over
    /// whatever the restore concluded, and a clear that raced it discards the
    /// restored session. Calling this more than once is a no-op.
    pub fn finish_restore(&self, restored: Option<Session>) {
        let mut state = self.state.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        if !state.snapshot.loading {
            tracing::debug!("restore already finished; ignoring");
            return;
        }
        state.snapshot.loading = false;
        if state.snapshot.session.is_some() {
            return;
        }
        match restored {
            Some(session) if !state.restore_cancelled => {
                self.persist(&session);
                tracing::info!(user_id = session.user_id(), username = session.username(), "session restored");
                state.snapshot.session = Some(session);
            }
            Some(_) => {
                tracing::info!("session ended during restore; discarding restored session");
                self.erase_persisted();
            }
            None => self.erase_persisted(),
        }
    }

    fn clear_locked(&self, state: &mut StoreState) {
        self.erase_persisted();
        if state.snapshot.loading {
            state.restore_cancelled = true;
        }
        if let Some(session) = state.snapshot.session.take() {
            tracing::info!(user_id = session.user_id(), "session cleared");
        }
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::error!(error = %e, key, "session storage read failed");
                None
            }
        }
    }

    fn persist(&self, session: &Session) {
        let user = match serde_json::to_string(session.identity()) {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(error = %e, "admin identity serialize failed");
                return;
            }
        };
        if let Err(e) = self.storage.set_all(&[(USER_KEY, user.as_str()), (TOKEN_KEY, session.credential())]) {
            tracing::error!(error = %e, "session storage write failed");
        }
    }

    fn erase_persisted(&self) {
        if let Err(e) = self.storage.remove_all(&[USER_KEY, TOKEN_KEY]) {
            tracing::error!(error = %e, "session storage erase failed");
        }
    }
}
