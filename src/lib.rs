//! Admin back-office session core.
//!
//! SYSTEM CONTEXT
//! ==============
//! Admin screens talk to the content API through one [`net::client::GuardedClient`].
//! The client reads the bearer credential from the [`state::session::SessionStore`]
//! and tears the session down when the server rejects it. [`state::auth::AuthController`]
//! owns the restore/login/logout lifecycle and [`guard`] decides what a route may render.
//!
//! `mock` backs the same contracts with in-memory fixtures, both directly and
//! over HTTP via a small axum server.

pub mod app;
pub mod config;
pub mod error;
pub mod guard;
pub mod mock;
pub mod net;
pub mod state;
