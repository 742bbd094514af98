//! Route guard for protected admin screens.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every admin route runs the same check so loading, redirect, and
//! access-denied behavior never diverge between screens.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use crate::net::types::Role;
use crate::state::navigation::Navigator;
use crate::state::session::{SessionSnapshot, SessionStore};

/// What a protected route should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Restore has not finished; render a placeholder.
    Loading,
    /// No session; send the user to login, remembering where they were going.
    RedirectToLogin { from: String },
    /// Signed in, but without the required role.
    AccessDenied,
    /// Render the protected content.
    Render,
}

/// True once auth has loaded and nobody is signed in.
#[must_use]
pub fn should_redirect_unauth(state: &SessionSnapshot) -> bool {
    !state.loading && !state.is_authenticated()
}

/// Decide what `requested` may render for the given session state.
#[must_use]
pub fn evaluate(state: &SessionSnapshot, required_role: Option<&Role>, requested: &str) -> GuardDecision {
    if state.loading {
        return GuardDecision::Loading;
    }
    let Some(role) = state.role() else {
        return GuardDecision::RedirectToLogin { from: requested.to_owned() };
    };
    match required_role {
        Some(required) if required != role => GuardDecision::AccessDenied,
        _ => GuardDecision::Render,
    }
}

/// Evaluate against the live store and perform the login redirect if needed.
pub fn guard_route(
    store: &SessionStore,
    navigator: &Navigator,
    required_role: Option<&Role>,
    requested: &str,
) -> GuardDecision {
    let decision = evaluate(&store.snapshot(), required_role, requested);
    match &decision {
        GuardDecision::RedirectToLogin { from } => navigator.redirect_to_login_from(from),
        GuardDecision::Render => navigator.navigate(requested),
        GuardDecision::Loading | GuardDecision::AccessDenied => {}
    }
    decision
}
