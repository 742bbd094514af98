//! Client-side state: the session store, its persistence, the auth
//! lifecycle, and the active view.

pub mod auth;
pub mod navigation;
pub mod session;
pub mod storage;
