//! Networking modules for the admin REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `client` is the guarded transport, `api` and `records` are the endpoint
//! seams built on it, and `types` defines the shared wire schema.

pub mod api;
pub mod client;
pub mod records;
pub mod types;
