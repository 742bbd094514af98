//! Guarded HTTP client: the single access point for admin API traffic.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every request picks up the bearer credential from the [`SessionStore`].
//! Every response is run through [`classify`]; an `Unauthorized` verdict
//! clears the store and fires the injected `on_session_invalid` callback
//! before the call resolves, whichever screen issued it. A rejection of a
//! credential that has since been replaced leaves the new session alone.
//!
//! ERROR HANDLING
//! ==============
//! A request that never gets a response is a transport error and leaves the
//! session alone. Nothing here retries; callers own retry policy.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::ApiError;
use crate::config::ClientConfig;
use crate::state::session::SessionStore;

pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const VALIDATE_PATH: &str = "/auth/validate";

/// Invoked after the store has been cleared because the server rejected the session.
pub type SessionInvalidHandler = Arc<dyn Fn() + Send + Sync>;

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// What the client must do with a response before handing it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// Deliver unchanged; the caller branches on status.
    PassThrough,
    /// Bad username/password on the login endpoint. Not a session expiry.
    CredentialRejected,
    /// The credential is expired or revoked; the whole session is dead.
    Unauthorized,
}

/// Classify a response by status and request path.
#[must_use]
pub fn classify(status: u16, path: &str) -> ResponseClass {
    if status != 401 {
        return ResponseClass::PassThrough;
    }
    if path == LOGIN_PATH {
        ResponseClass::CredentialRejected
    } else {
        ResponseClass::Unauthorized
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// A response that made it past the session guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    status: u16,
    body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into [`ApiError::Status`].
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` when the status is outside 200..300.
    pub fn into_success(self) -> Result<Self, ApiError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::Status { status: self.status, body: self.body })
        }
    }

    /// Parse the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct GuardedClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<SessionStore>,
    on_session_invalid: SessionInvalidHandler,
}

impl GuardedClient {
    /// Build a client bound to `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP client fails to build.
    pub fn new(
        config: &ClientConfig,
        store: Arc<SessionStore>,
        on_session_invalid: SessionInvalidHandler,
    ) -> Result<Self, ApiError> {
        let base_url = crate::config::normalize_base_url(&config.base_url);
        reqwest::Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url, store, on_session_invalid })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a bodyless request with the session credential attached.
    ///
    /// # Errors
    ///
    /// Returns a transport error when no response arrives, or
    /// `ApiError::Unauthorized` after a 401 has torn the session down.
    pub async fn send(&self, method: Method, path: &str) -> Result<ApiResponse, ApiError> {
        self.execute(method, path, None, self.store.credential()).await
    }

    /// Send a JSON body with the session credential attached.
    ///
    /// # Errors
    ///
    /// As [`GuardedClient::send`], plus `ApiError::Encode` if `body` fails to serialize.
    pub async fn send_json<B>(&self, method: Method, path: &str, body: &B) -> Result<ApiResponse, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        self.execute(method, path, Some(body), self.store.credential())
            .await
    }

    /// Send a bodyless request with an explicit credential instead of the
    /// store's. Used to validate a persisted token before it is trusted.
    ///
    /// # Errors
    ///
    /// As [`GuardedClient::send`].
    pub async fn send_with_credential(&self, method: Method, path: &str, credential: &str) -> Result<ApiResponse, ApiError> {
        self.execute(method, path, None, Some(credential.to_owned()))
            .await
    }

    /// `GET` and decode a successful JSON body.
    ///
    /// # Errors
    ///
    /// Returns any send error, `ApiError::Status` for non-2xx, or `ApiError::Decode`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::GET, path).await?.into_success()?.json()
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        credential: Option<String>,
    ) -> Result<ApiResponse, ApiError> {
        let mut request = self.http.request(method.clone(), self.url(path));
        if let Some(credential) = &credential {
            request = request.bearer_auth(credential);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(&method, path, &e))?;
        let status = response.status().as_u16();

        match classify(status, path) {
            ResponseClass::Unauthorized => {
                self.invalidate_session(&method, path, credential.as_deref());
                return Err(ApiError::Unauthorized);
            }
            ResponseClass::CredentialRejected => {
                tracing::debug!(%method, path, "credentials rejected");
            }
            ResponseClass::PassThrough => {}
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&method, path, &e))?;
        Ok(ApiResponse { status, body })
    }

    /// Tear the session down, unless the rejected credential is no longer the
    /// one in force (a persisted token being validated while a login landed).
    fn invalidate_session(&self, method: &Method, path: &str, rejected: Option<&str>) {
        if !self.store.clear_if_current(rejected) {
            tracing::debug!(%method, path, "stale credential rejected; session kept");
            return;
        }
        tracing::warn!(%method, path, "server rejected session; signing out");
        (self.on_session_invalid)();
    }
}

fn transport_error(method: &Method, path: &str, error: &reqwest::Error) -> ApiError {
    if error.is_timeout() {
        tracing::warn!(%method, path, "API request timed out");
        ApiError::Timeout
    } else {
        tracing::warn!(%method, path, error = %error, "API request failed");
        ApiError::Transport(error.to_string())
    }
}
