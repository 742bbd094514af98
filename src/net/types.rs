//! Wire DTOs and errors for the admin REST API.
//!
//! DESIGN
//! ======
//! Field names mirror the server's JSON exactly so the same types serve the
//! HTTP client, the in-memory mock backend, and the mock server routes.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by admin API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The configured base address could not be used to build a request.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),

    /// No response reached the client (connect/reset/body read failure).
    #[error("API request failed: {0}")]
    Transport(String),

    /// The request exceeded the configured timeout.
    #[error("API request timed out")]
    Timeout,

    /// The server rejected the credential; the session has already been cleared.
    #[error("session rejected by server")]
    Unauthorized,

    /// The server returned a non-success status.
    #[error("API response error: status {status}")]
    Status { status: u16, body: String },

    /// A request body could not be serialized.
    #[error("API request encode failed: {0}")]
    Encode(String),

    /// A response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    Decode(String),
}

impl ApiError {
    /// True when the failure happened below HTTP: nothing was heard from the server.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "E_INVALID_URL",
            Self::ClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Transport(_) => "E_TRANSPORT",
            Self::Timeout => "E_TIMEOUT",
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::Status { .. } => "E_API_RESPONSE",
            Self::Encode(_) => "E_API_ENCODE",
            Self::Decode(_) => "E_API_PARSE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout | Self::Status { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

/// Admin surface role. Unknown role strings survive parsing as `Other`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    #[serde(other)]
    Other,
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// An authenticated admin user as returned by `/auth/login` and `/auth/validate`.
///
/// Persisted verbatim under the `adminUser` storage key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Server-assigned user identifier.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Login name.
    pub username: String,
    /// Access role.
    pub role: Role,
}

/// Accept either a JSON string or number for ids; some backends emit integers.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        _ => Err(D::Error::custom("expected string or number id")),
    }
}

// =============================================================================
// AUTH PAYLOADS
// =============================================================================

/// `POST /auth/login` request body.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// `POST /auth/login` response body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LoginResponse {
    #[must_use]
    pub fn accepted(user: Identity, token: String) -> Self {
        Self { success: true, user: Some(user), token: Some(token), message: None }
    }

    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self { success: false, user: None, token: None, message: Some(message.into()) }
    }
}

/// `GET /auth/validate` response body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
}

impl ValidateResponse {
    #[must_use]
    pub fn invalid() -> Self {
        Self { valid: false, user: None }
    }
}

/// Error body emitted by the server for rejected requests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

// =============================================================================
// RECORDS
// =============================================================================

/// Content collections exposed by the admin API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Slides,
    Testimonials,
    Blogs,
    Careers,
    Applicants,
    Contacts,
    Settings,
}

impl Resource {
    pub const ALL: [Self; 7] = [
        Self::Slides,
        Self::Testimonials,
        Self::Blogs,
        Self::Careers,
        Self::Applicants,
        Self::Contacts,
        Self::Settings,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slides => "slides",
            Self::Testimonials => "testimonials",
            Self::Blogs => "blogs",
            Self::Careers => "careers",
            Self::Applicants => "applicants",
            Self::Contacts => "contacts",
            Self::Settings => "settings",
        }
    }

    /// Collection path relative to the API base.
    #[must_use]
    pub fn collection_path(self) -> String {
        format!("/{}", self.as_str())
    }

    /// Item path relative to the API base, with `id` percent-encoded as a
    /// single path segment.
    #[must_use]
    pub fn item_path(self, id: &str) -> String {
        let Ok(mut url) = reqwest::Url::parse("http://admin.invalid/") else {
            return self.collection_path();
        };
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.clear().push(self.as_str()).push(id);
        }
        url.path().to_owned()
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Resource {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == raw)
            .ok_or_else(|| format!("unknown resource: {raw}"))
    }
}

/// Open-ended field map for a content record.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// A content record: an id plus whatever fields the collection carries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: Fields,
}
