//! In-memory mock backend for running the admin surface without a server.
//!
//! DESIGN
//! ======
//! `MockBackend` holds the fixture accounts and content collections.
//! [`MockAuthApi`] and [`MockRecordSource`] plug it into the same seams the
//! HTTP implementations use, and [`server`] exposes it over the REST
//! contract so the HTTP path can be exercised end to end.
//!
//! Tokens encode the user id (`mock-token-<id>-<hex>`) so a token issued by
//! one process still validates in the next; logout revokes per process.

pub mod server;

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::Rng;

use crate::net::api::AuthApi;
use crate::net::records::RecordSource;
use crate::net::types::{
    ApiError, Fields, Identity, LoginResponse, Record, Resource, Role, ValidateResponse,
};
use crate::state::session::SessionStore;

pub const MOCK_USERNAME: &str = "admin";
pub const MOCK_PASSWORD: &str = "admin123";
const TOKEN_PREFIX: &str = "mock-token-";

struct MockAccount {
    identity: Identity,
    password: String,
}

fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a mock bearer token for `user_id`.
#[must_use]
pub fn generate_token(user_id: &str) -> String {
    let bytes: [u8; 32] = rand::rng().random();
    format!("{TOKEN_PREFIX}{user_id}-{}", bytes_to_hex(&bytes))
}

fn token_user_id(token: &str) -> Option<&str> {
    let rest = token.strip_prefix(TOKEN_PREFIX)?;
    let (user_id, secret) = rest.rsplit_once('-')?;
    (!user_id.is_empty() && secret.len() == 64 && secret.chars().all(|c| c.is_ascii_hexdigit())).then_some(user_id)
}

// =============================================================================
// BACKEND
// =============================================================================

pub struct MockBackend {
    accounts: Vec<MockAccount>,
    revoked: Mutex<HashSet<String>>,
    records: Mutex<HashMap<Resource, Vec<Record>>>,
}

impl MockBackend {
    /// Backend with the default admin account and no content.
    #[must_use]
    pub fn new() -> Self {
        let admin = MockAccount {
            identity: Identity { id: "1".to_owned(), username: MOCK_USERNAME.to_owned(), role: Role::Admin },
            password: MOCK_PASSWORD.to_owned(),
        };
        Self { accounts: vec![admin], revoked: Mutex::new(HashSet::new()), records: Mutex::new(HashMap::new()) }
    }

    /// Backend with the default admin account and sample content in every collection.
    #[must_use]
    pub fn seeded() -> Self {
        let backend = Self::new();
        for (resource, fields) in fixtures() {
            backend.insert(resource, fields);
        }
        backend
    }

    /// Add an extra account.
    #[must_use]
    pub fn with_account(mut self, identity: Identity, password: &str) -> Self {
        self.accounts.push(MockAccount { identity, password: password.to_owned() });
        self
    }

    pub fn login(&self, username: &str, password: &str) -> LoginResponse {
        let account = self
            .accounts
            .iter()
            .find(|a| a.identity.username == username && a.password == password);
        match account {
            Some(account) => {
                let token = generate_token(&account.identity.id);
                tracing::debug!(username, "mock login accepted");
                LoginResponse::accepted(account.identity.clone(), token)
            }
            None => LoginResponse::rejected("Invalid credentials"),
        }
    }

    pub fn logout(&self, token: &str) {
        self.revoked
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(token.to_owned());
    }

    /// Resolve a token to its account, if it is well formed and not revoked.
    #[must_use]
    pub fn identity_for(&self, token: &str) -> Option<Identity> {
        let user_id = token_user_id(token)?;
        let revoked = self
            .revoked
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if revoked.contains(token) {
            return None;
        }
        self.accounts
            .iter()
            .find(|a| a.identity.id == user_id)
            .map(|a| a.identity.clone())
    }

    #[must_use]
    pub fn validate(&self, token: &str) -> ValidateResponse {
        match self.identity_for(token) {
            Some(user) => ValidateResponse { valid: true, user: Some(user) },
            None => ValidateResponse::invalid(),
        }
    }

    #[must_use]
    pub fn list(&self, resource: Resource) -> Vec<Record> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&resource)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn get(&self, resource: Resource, id: &str) -> Option<Record> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&resource)
            .and_then(|items| items.iter().find(|r| r.id == id).cloned())
    }

    pub fn insert(&self, resource: Resource, mut fields: Fields) -> Record {
        fields.remove("id");
        let record = Record { id: uuid::Uuid::new_v4().to_string(), fields };
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entry(resource)
            .or_default()
            .push(record.clone());
        record
    }

    /// Merge `fields` into an existing record. Returns `None` if it does not exist.
    pub fn update(&self, resource: Resource, id: &str, mut fields: Fields) -> Option<Record> {
        fields.remove("id");
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let record = records.get_mut(&resource)?.iter_mut().find(|r| r.id == id)?;
        record.fields.extend(fields);
        Some(record.clone())
    }

    /// Returns `false` if the record did not exist.
    pub fn remove(&self, resource: Resource, id: &str) -> bool {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(items) = records.get_mut(&resource) else {
            return false;
        };
        let before = items.len();
        items.retain(|r| r.id != id);
        items.len() != before
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn fixtures() -> Vec<(Resource, Fields)> {
    let rows = [
        (Resource::Slides, serde_json::json!({"title": "Engineering that scales", "subtitle": "Cloud, data and product teams", "image": "/img/hero-1.jpg", "order": 1})),
        (Resource::Slides, serde_json::json!({"title": "Trusted by enterprises", "subtitle": "Fifteen years of delivery", "image": "/img/hero-2.jpg", "order": 2})),
        (Resource::Testimonials, serde_json::json!({"name": "Dana Whitfield", "company": "Northwind", "quote": "They shipped on time and on budget.", "rating": 5})),
        (Resource::Blogs, serde_json::json!({"title": "Migrating to managed Postgres", "author": "admin", "published": true})),
        (Resource::Careers, serde_json::json!({"title": "Backend Engineer", "location": "Remote", "type": "Full-time", "open": true})),
        (Resource::Applicants, serde_json::json!({"name": "Sam Ortega", "email": "sam@example.com", "position": "Backend Engineer", "status": "new"})),
        (Resource::Contacts, serde_json::json!({"name": "Lee Park", "email": "lee@example.com", "message": "Requesting a quote.", "read": false})),
        (Resource::Settings, serde_json::json!({"siteName": "Acme Consulting", "contactEmail": "hello@example.com", "phone": "+1 555 0100"})),
    ];
    rows.into_iter()
        .filter_map(|(resource, value)| match value {
            serde_json::Value::Object(fields) => Some((resource, fields)),
            _ => None,
        })
        .collect()
}

// =============================================================================
// SEAM IMPLEMENTATIONS
// =============================================================================

/// [`AuthApi`] answered directly from a [`MockBackend`].
pub struct MockAuthApi {
    backend: Arc<MockBackend>,
    store: Arc<SessionStore>,
}

impl MockAuthApi {
    #[must_use]
    pub fn new(backend: Arc<MockBackend>, store: Arc<SessionStore>) -> Self {
        Self { backend, store }
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        Ok(self.backend.login(username, password))
    }

    async fn logout(&self) -> Result<(), ApiError> {
        if let Some(token) = self.store.credential() {
            self.backend.logout(&token);
        }
        Ok(())
    }

    async fn validate(&self, credential: &str) -> Result<ValidateResponse, ApiError> {
        Ok(self.backend.validate(credential))
    }
}

/// [`RecordSource`] answered directly from a [`MockBackend`].
pub struct MockRecordSource {
    backend: Arc<MockBackend>,
}

impl MockRecordSource {
    #[must_use]
    pub fn new(backend: Arc<MockBackend>) -> Self {
        Self { backend }
    }
}

fn not_found(resource: Resource, id: &str) -> ApiError {
    ApiError::Status { status: 404, body: format!("{resource} {id} not found") }
}

#[async_trait]
impl RecordSource for MockRecordSource {
    async fn list(&self, resource: Resource) -> Result<Vec<Record>, ApiError> {
        Ok(self.backend.list(resource))
    }

    async fn get(&self, resource: Resource, id: &str) -> Result<Record, ApiError> {
        self.backend
            .get(resource, id)
            .ok_or_else(|| not_found(resource, id))
    }

    async fn create(&self, resource: Resource, fields: Fields) -> Result<Record, ApiError> {
        Ok(self.backend.insert(resource, fields))
    }

    async fn update(&self, resource: Resource, id: &str, fields: Fields) -> Result<Record, ApiError> {
        self.backend
            .update(resource, id, fields)
            .ok_or_else(|| not_found(resource, id))
    }

    async fn delete(&self, resource: Resource, id: &str) -> Result<(), ApiError> {
        if self.backend.remove(resource, id) { Ok(()) } else { Err(not_found(resource, id)) }
    }
}
