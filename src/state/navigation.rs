//! Active-view tracking and forced login redirects.
//!
//! SYSTEM CONTEXT
//! ==============
//! The guarded client calls [`Navigator::redirect_to_login`] (through the
//! handler from [`Navigator::invalidation_handler`]) when the server rejects
//! the session, and the route guard calls [`Navigator::redirect_to_login_from`]
//! for a protected location with no session. The login flow then reads the
//! superseded location back via [`Navigator::take_return_to`].

#[cfg(test)]
#[path = "navigation_test.rs"]
mod navigation_test;

use std::sync::{Arc, RwLock};

use crate::net::client::SessionInvalidHandler;

pub const LOGIN_ROUTE: &str = "/admin/login";
pub const DASHBOARD_ROUTE: &str = "/admin";

#[derive(Debug)]
struct NavState {
    current: String,
    return_to: Option<String>,
}

#[derive(Debug)]
pub struct Navigator {
    inner: RwLock<NavState>,
}

impl Navigator {
    #[must_use]
    pub fn new(initial: impl Into<String>) -> Self {
        Self { inner: RwLock::new(NavState { current: initial.into(), return_to: None }) }
    }

    /// Location currently being shown.
    #[must_use]
    pub fn current(&self) -> String {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .current
            .clone()
    }

    #[must_use]
    pub fn is_on_login(&self) -> bool {
        route_path(&self.current()) == LOGIN_ROUTE
    }

    pub fn navigate(&self, to: impl Into<String>) {
        let to = to.into();
        let mut state = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        tracing::debug!(from = %state.current, to = %to, "navigate");
        state.current = to;
    }

    /// Replace the active view with the login entry point, remembering where
    /// the user was so a later login can send them back.
    pub fn redirect_to_login(&self) {
        let mut state = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        if route_path(&state.current) != LOGIN_ROUTE {
            state.return_to = Some(std::mem::take(&mut state.current));
        }
        state.current = login_location(state.return_to.as_deref());
        tracing::info!(to = %state.current, "redirected to login");
    }

    /// Send the user to login because `from` needs a session, remembering
    /// `from` so a later login can send them there.
    pub fn redirect_to_login_from(&self, from: &str) {
        let mut state = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        if !from.is_empty() && route_path(from) != LOGIN_ROUTE {
            state.return_to = Some(from.to_owned());
        }
        state.current = login_location(state.return_to.as_deref());
        tracing::info!(to = %state.current, "redirected to login");
    }

    /// Location a login should return to, consumed on read.
    pub fn take_return_to(&self) -> Option<String> {
        self.inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .return_to
            .take()
    }

    /// Callback for the guarded client's session-invalid hook.
    #[must_use]
    pub fn invalidation_handler(self: &Arc<Self>) -> SessionInvalidHandler {
        let navigator = Arc::clone(self);
        Arc::new(move || navigator.redirect_to_login())
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(DASHBOARD_ROUTE)
    }
}

/// Login URL carrying the originally requested location as `?from=`.
#[must_use]
pub fn login_location(from: Option<&str>) -> String {
    let Some(from) = from.filter(|f| !f.is_empty() && route_path(f) != LOGIN_ROUTE) else {
        return LOGIN_ROUTE.to_owned();
    };
    // Any absolute origin works; only the path and query are kept.
    let base = format!("http://admin.invalid{LOGIN_ROUTE}");
    match reqwest::Url::parse_with_params(&base, &[("from", from)]) {
        Ok(url) => format!("{}?{}", url.path(), url.query().unwrap_or_default()),
        Err(_) => LOGIN_ROUTE.to_owned(),
    }
}

fn route_path(location: &str) -> &str {
    location.split(['?', '#']).next().unwrap_or(location)
}
