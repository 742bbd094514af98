//! Startup wiring for the admin surface.
//!
//! DESIGN
//! ======
//! The backend (HTTP or mock) is picked here, once. Everything downstream
//! sees only the `AuthApi` / `RecordSource` seams, and the store-to-client
//! binding is visible in one constructor call.

use std::sync::Arc;

use crate::config::{ApiMode, ClientConfig};
use crate::mock::{MockAuthApi, MockBackend, MockRecordSource};
use crate::net::api::{AuthApi, HttpAuthApi};
use crate::net::client::GuardedClient;
use crate::net::records::{HttpRecordSource, RecordSource};
use crate::net::types::ApiError;
use crate::state::auth::AuthController;
use crate::state::navigation::Navigator;
use crate::state::session::SessionStore;
use crate::state::storage::Storage;

pub struct AdminApp {
    pub store: Arc<SessionStore>,
    pub navigator: Arc<Navigator>,
    pub auth: AuthController,
    pub records: Arc<dyn RecordSource>,
}

impl AdminApp {
    /// Wire the store, navigator, and backend seams for `config.mode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn build(config: &ClientConfig, storage: Arc<dyn Storage>) -> Result<Self, ApiError> {
        let store = Arc::new(SessionStore::new(storage));
        let navigator = Arc::new(Navigator::default());

        let (api, records): (Arc<dyn AuthApi>, Arc<dyn RecordSource>) = match config.mode {
            ApiMode::Http => {
                let client = Arc::new(GuardedClient::new(config, store.clone(), navigator.invalidation_handler())?);
                tracing::debug!(base_url = client.base_url(), "using HTTP backend");
                let api: Arc<dyn AuthApi> = Arc::new(HttpAuthApi::new(client.clone()));
                let records: Arc<dyn RecordSource> = Arc::new(HttpRecordSource::new(client));
                (api, records)
            }
            ApiMode::Mock => {
                let backend = Arc::new(MockBackend::seeded());
                tracing::debug!("using in-memory mock backend");
                let api: Arc<dyn AuthApi> = Arc::new(MockAuthApi::new(backend.clone(), store.clone()));
                let records: Arc<dyn RecordSource> = Arc::new(MockRecordSource::new(backend));
                (api, records)
            }
        };

        let auth = AuthController::new(store.clone(), api);
        Ok(Self { store, navigator, auth, records })
    }

    /// Run the startup restore. Screens should not render until this returns.
    pub async fn start(&self) {
        self.auth.restore().await;
    }
}

#[cfg(test)]
#[path = "app_test.rs"]
mod tests;
