//! Auth lifecycle: restore at startup, login, logout.
//!
//! SYSTEM CONTEXT
//! ==============
//! Screens call this facade; it talks to whichever [`AuthApi`] was chosen at
//! startup and writes the outcome into the [`SessionStore`].
//!
//! ERROR HANDLING
//! ==============
//! Nothing here returns an error to the caller. Login reports a boolean
//! (or a [`LoginOutcome`] for callers that want the reason), restore falls
//! back to "no session", and logout always clears locally.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;

use super::session::{Session, SessionStore};
use crate::net::api::AuthApi;
use crate::net::types::{ApiError, Identity};

/// Detailed result of a login attempt.
#[derive(Debug)]
pub enum LoginOutcome {
    /// The server accepted the credentials; the session is active.
    Success(Identity),
    /// The server said no. Any existing session is untouched.
    Rejected(Option<String>),
    /// The request could not be completed.
    Failed(ApiError),
}

impl LoginOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

pub struct AuthController {
    store: Arc<SessionStore>,
    api: Arc<dyn AuthApi>,
}

impl AuthController {
    #[must_use]
    pub fn new(store: Arc<SessionStore>, api: Arc<dyn AuthApi>) -> Self {
        Self { store, api }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    /// Load the persisted session and confirm it with the server before
    /// exposing it. Leaves `Loading` exactly once, whatever happens.
    pub async fn restore(&self) {
        let restored = match self.store.load_persisted() {
            Some(candidate) => self.confirm(candidate).await,
            None => {
                tracing::debug!("no persisted session");
                None
            }
        };
        self.store.finish_restore(restored);
    }

    async fn confirm(&self, candidate: Session) -> Option<Session> {
        match self.api.validate(candidate.credential()).await {
            Ok(response) if response.valid => {
                let identity = response.user.unwrap_or_else(|| candidate.identity().clone());
                Session::new(identity, candidate.credential())
            }
            Ok(_) => {
                tracing::info!(user_id = candidate.user_id(), "persisted session no longer valid");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "session validation failed; starting signed out");
                None
            }
        }
    }

    /// Log in and report only whether it worked.
    pub async fn login(&self, username: &str, password: &str) -> bool {
        self.login_with_outcome(username, password)
            .await
            .is_success()
    }

    /// Log in and report why it did or did not work.
    pub async fn login_with_outcome(&self, username: &str, password: &str) -> LoginOutcome {
        let response = match self.api.login(username, password).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, username, "login request failed");
                return LoginOutcome::Failed(e);
            }
        };
        if !response.success {
            tracing::info!(username, "login rejected");
            return LoginOutcome::Rejected(response.message);
        }

        let session = match (response.user, response.token) {
            (Some(identity), Some(token)) => Session::new(identity, token),
            _ => None,
        };
        let Some(session) = session else {
            tracing::warn!(username, "login succeeded without a usable identity or token");
            return LoginOutcome::Failed(ApiError::Decode("login response missing user or token".to_owned()));
        };

        let identity = session.identity().clone();
        self.store.establish(session);
        LoginOutcome::Success(identity)
    }

    /// End the session. Server notification is best-effort; local state is
    /// always cleared. Safe to call when already signed out.
    ///
    /// During the startup restore there is no session to notify about yet,
    /// but the persisted one is erased and the restore is told to discard it.
    pub async fn logout(&self) {
        if !self.store.is_authenticated() {
            if self.store.is_loading() {
                tracing::info!("logout during restore; discarding persisted session");
                self.store.clear();
            } else {
                tracing::debug!("logout with no active session");
            }
            return;
        }
        if let Err(e) = self.api.logout().await {
            tracing::debug!(error = %e, "logout notification failed; clearing locally");
        }
        self.store.clear();
    }
}
