//! Auth endpoints behind one trait so the mock backend can stand in.
//!
//! DESIGN
//! ======
//! `AuthApi` is the seam chosen once at startup: [`HttpAuthApi`] speaks REST
//! through the guarded client, `mock::MockAuthApi` answers from fixtures.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;

use super::client::{ApiResponse, GuardedClient, LOGIN_PATH, LOGOUT_PATH, VALIDATE_PATH};
use super::types::{ApiError, LoginRequest, LoginResponse, ValidateResponse};

const DEFAULT_REJECTION: &str = "Invalid credentials";

#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange username/password for an identity and credential.
    ///
    /// A credential rejection is `Ok` with `success: false`; `Err` means the
    /// question could not be asked.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError>;

    /// Tell the server the current session is ending.
    async fn logout(&self) -> Result<(), ApiError>;

    /// Ask whether `credential` is still good.
    async fn validate(&self, credential: &str) -> Result<ValidateResponse, ApiError>;
}

pub struct HttpAuthApi {
    client: Arc<GuardedClient>,
}

impl HttpAuthApi {
    #[must_use]
    pub fn new(client: Arc<GuardedClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let response = self
            .client
            .send_json(Method::POST, LOGIN_PATH, &LoginRequest { username, password })
            .await?;
        parse_login_response(&response)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.client
            .send(Method::POST, LOGOUT_PATH)
            .await?
            .into_success()?;
        Ok(())
    }

    async fn validate(&self, credential: &str) -> Result<ValidateResponse, ApiError> {
        let response = self
            .client
            .send_with_credential(Method::GET, VALIDATE_PATH, credential)
            .await?;
        response.into_success()?.json()
    }
}

/// Map a login response to a [`LoginResponse`].
///
/// 400/401/403 are credential rejections even when the body is not the
/// usual envelope; other non-2xx statuses are errors.
fn parse_login_response(response: &ApiResponse) -> Result<LoginResponse, ApiError> {
    if matches!(response.status(), 400 | 401 | 403) {
        let parsed = response
            .json::<LoginResponse>()
            .ok()
            .filter(|r| !r.success);
        return Ok(parsed.unwrap_or_else(|| LoginResponse::rejected(rejection_message(response.body()))));
    }
    if !response.is_success() {
        return Err(ApiError::Status { status: response.status(), body: response.body().to_owned() });
    }
    response.json()
}

fn rejection_message(body: &str) -> String {
    serde_json::from_str::<super::types::ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| DEFAULT_REJECTION.to_owned())
}
