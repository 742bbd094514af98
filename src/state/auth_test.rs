use super::*;

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::mock::{MockAuthApi, MockBackend};
use crate::net::types::{LoginResponse, Role, ValidateResponse};
use crate::state::storage::{MemoryStorage, Storage, TOKEN_KEY, USER_KEY};

fn admin() -> Identity {
    Identity { id: "1".to_owned(), username: "admin".to_owned(), role: Role::Admin }
}

/// Scripted `AuthApi` with canned responses.
struct ScriptedApi {
    login: Mutex<Option<Result<LoginResponse, ApiError>>>,
    validate: Mutex<Option<Result<ValidateResponse, ApiError>>>,
    logout_fails: bool,
    logout_calls: AtomicUsize,
    validate_calls: AtomicUsize,
}

impl ScriptedApi {
    fn new() -> Self {
        Self {
            login: Mutex::new(None),
            validate: Mutex::new(None),
            logout_fails: false,
            logout_calls: AtomicUsize::new(0),
            validate_calls: AtomicUsize::new(0),
        }
    }

    fn with_login(self, response: Result<LoginResponse, ApiError>) -> Self {
        *self.login.lock().unwrap() = Some(response);
        self
    }

    fn with_validate(self, response: Result<ValidateResponse, ApiError>) -> Self {
        *self.validate.lock().unwrap() = Some(response);
        self
    }

    fn failing_logout(mut self) -> Self {
        self.logout_fails = true;
        self
    }
}

#[async_trait]
impl AuthApi for ScriptedApi {
    async fn login(&self, _username: &str, _password: &str) -> Result<LoginResponse, ApiError> {
        self.login
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(ApiError::Transport("no scripted login".to_owned())))
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.logout_fails { Err(ApiError::Transport("connection refused".to_owned())) } else { Ok(()) }
    }

    async fn validate(&self, _credential: &str) -> Result<ValidateResponse, ApiError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        self.validate
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(ApiError::Transport("no scripted validate".to_owned())))
    }
}

fn persisted_storage(token: &str) -> Arc<MemoryStorage> {
    let user = serde_json::to_string(&admin()).unwrap();
    Arc::new(MemoryStorage::with_entries(&[(USER_KEY, user.as_str()), (TOKEN_KEY, token)]))
}

fn controller(storage: Arc<MemoryStorage>, api: Arc<ScriptedApi>) -> AuthController {
    AuthController::new(Arc::new(SessionStore::new(storage)), api)
}

// =============================================================================
// restore
// =============================================================================

#[tokio::test]
async fn restore_with_valid_token_authenticates() {
    let storage = persisted_storage("tok");
    let api = Arc::new(ScriptedApi::new().with_validate(Ok(ValidateResponse { valid: true, user: None })));
    let auth = controller(storage, api);

    assert!(auth.store().is_loading());
    auth.restore().await;

    let snapshot = auth.store().snapshot();
    assert!(!snapshot.loading);
    assert!(snapshot.is_authenticated());
    assert_eq!(auth.store().credential().as_deref(), Some("tok"));
}

#[tokio::test]
async fn restore_prefers_server_identity() {
    let storage = persisted_storage("tok");
    let renamed = Identity { username: "root".to_owned(), ..admin() };
    let api = Arc::new(ScriptedApi::new().with_validate(Ok(ValidateResponse { valid: true, user: Some(renamed) })));
    let auth = controller(storage.clone(), api);

    auth.restore().await;

    assert_eq!(auth.store().session().unwrap().username(), "root");
    assert!(storage.get(USER_KEY).unwrap().unwrap().contains("root"));
}

#[tokio::test]
async fn restore_with_invalid_token_clears_storage() {
    let storage = persisted_storage("stale");
    let api = Arc::new(ScriptedApi::new().with_validate(Ok(ValidateResponse::invalid())));
    let auth = controller(storage.clone(), api);

    assert!(auth.store().is_loading());
    auth.restore().await;

    assert!(!auth.store().is_loading());
    assert!(!auth.is_authenticated());
    assert!(!storage.contains(USER_KEY));
    assert!(!storage.contains(TOKEN_KEY));
}

#[tokio::test]
async fn restore_with_transport_failure_starts_signed_out() {
    let storage = persisted_storage("tok");
    let api = Arc::new(ScriptedApi::new().with_validate(Err(ApiError::Timeout)));
    let auth = controller(storage.clone(), api);

    auth.restore().await;

    assert!(!auth.store().is_loading());
    assert!(!auth.is_authenticated());
    assert!(!storage.contains(TOKEN_KEY));
}

#[tokio::test]
async fn restore_with_partial_storage_skips_validation() {
    let storage = Arc::new(MemoryStorage::with_entries(&[(TOKEN_KEY, "orphan")]));
    let api = Arc::new(ScriptedApi::new());
    let auth = controller(storage.clone(), api.clone());

    auth.restore().await;

    assert_eq!(api.validate_calls.load(Ordering::SeqCst), 0);
    assert!(!auth.store().is_loading());
    assert!(!auth.is_authenticated());
    assert!(!storage.contains(TOKEN_KEY));
}

// =============================================================================
// login
// =============================================================================

#[tokio::test]
async fn login_success_establishes_session() {
    let storage = Arc::new(MemoryStorage::new());
    let api = Arc::new(ScriptedApi::new().with_login(Ok(LoginResponse::accepted(admin(), "tok".to_owned()))));
    let auth = controller(storage.clone(), api);

    assert!(auth.login("admin", "admin123").await);
    assert!(auth.is_authenticated());
    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("tok"));
}

#[tokio::test]
async fn login_rejection_keeps_existing_session() {
    let storage = Arc::new(MemoryStorage::new());
    let api = Arc::new(ScriptedApi::new().with_login(Ok(LoginResponse::rejected("Invalid credentials"))));
    let auth = controller(storage.clone(), api);
    auth.store().establish(Session::new(admin(), "existing").unwrap());

    let outcome = auth.login_with_outcome("admin", "wrong").await;

    assert!(matches!(outcome, LoginOutcome::Rejected(Some(ref m)) if m == "Invalid credentials"));
    assert_eq!(auth.store().credential().as_deref(), Some("existing"));
    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("existing"));
}

#[tokio::test]
async fn login_transport_failure_returns_false() {
    let api = Arc::new(ScriptedApi::new().with_login(Err(ApiError::Transport("refused".to_owned()))));
    let auth = controller(Arc::new(MemoryStorage::new()), api);

    let outcome = auth.login_with_outcome("admin", "admin123").await;

    assert!(matches!(outcome, LoginOutcome::Failed(ref e) if e.is_transport()));
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn login_success_without_token_is_failure() {
    let response = LoginResponse { success: true, user: Some(admin()), token: None, message: None };
    let api = Arc::new(ScriptedApi::new().with_login(Ok(response)));
    let auth = controller(Arc::new(MemoryStorage::new()), api);

    assert!(!auth.login("admin", "admin123").await);
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn login_against_mock_backend() {
    let store = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
    let api = Arc::new(MockAuthApi::new(Arc::new(MockBackend::new()), store.clone()));
    let auth = AuthController::new(store.clone(), api);

    assert!(!auth.login("admin", "wrong").await);
    assert!(!auth.is_authenticated());

    assert!(auth.login("admin", "admin123").await);
    assert!(store.credential().is_some_and(|t| !t.is_empty()));
}

// =============================================================================
// logout
// =============================================================================

#[tokio::test]
async fn logout_clears_even_when_server_unreachable() {
    let storage = Arc::new(MemoryStorage::new());
    let api = Arc::new(ScriptedApi::new().failing_logout());
    let auth = controller(storage.clone(), api.clone());
    auth.store().establish(Session::new(admin(), "tok").unwrap());

    auth.logout().await;

    assert_eq!(api.logout_calls.load(Ordering::SeqCst), 1);
    assert!(!auth.is_authenticated());
    assert!(!storage.contains(TOKEN_KEY));
    assert!(!storage.contains(USER_KEY));
}

#[tokio::test]
async fn logout_when_signed_out_is_noop() {
    let api = Arc::new(ScriptedApi::new());
    let auth = controller(Arc::new(MemoryStorage::new()), api.clone());

    auth.logout().await;
    auth.logout().await;

    assert_eq!(api.logout_calls.load(Ordering::SeqCst), 0);
    assert!(!auth.is_authenticated());
}

/// `AuthApi` whose validate call parks until released.
struct GatedValidateApi {
    entered: tokio::sync::Notify,
    release: tokio::sync::Notify,
}

#[async_trait]
impl AuthApi for GatedValidateApi {
    async fn login(&self, _username: &str, _password: &str) -> Result<LoginResponse, ApiError> {
        Err(ApiError::Transport("not scripted".to_owned()))
    }

    async fn logout(&self) -> Result<(), ApiError> {
        Ok(())
    }

    async fn validate(&self, _credential: &str) -> Result<ValidateResponse, ApiError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(ValidateResponse { valid: true, user: None })
    }
}

#[tokio::test]
async fn logout_during_restore_stays_signed_out() {
    let storage = persisted_storage("tok");
    let api = Arc::new(GatedValidateApi { entered: tokio::sync::Notify::new(), release: tokio::sync::Notify::new() });
    let auth = AuthController::new(Arc::new(SessionStore::new(storage.clone())), api.clone());

    tokio::join!(auth.restore(), async {
        api.entered.notified().await;
        auth.logout().await;
        api.release.notify_one();
    });

    assert!(!auth.store().is_loading());
    assert!(!auth.is_authenticated());
    assert!(!storage.contains(TOKEN_KEY));
    assert!(!storage.contains(USER_KEY));
}
