use super::*;
use crate::state::storage::MemoryStorage;

// =============================================================================
// tokens
// =============================================================================

#[test]
fn bytes_to_hex_formats_pairs() {
    assert_eq!(bytes_to_hex(&[0x0a, 0xff]), "0aff");
    assert_eq!(bytes_to_hex(&[]), "");
}

#[test]
fn generate_token_encodes_user_id() {
    let token = generate_token("1");
    assert!(token.starts_with("mock-token-1-"));
    assert_eq!(token_user_id(&token), Some("1"));
}

#[test]
fn generate_token_two_calls_differ() {
    assert_ne!(generate_token("1"), generate_token("1"));
}

#[test]
fn token_user_id_rejects_malformed() {
    assert_eq!(token_user_id("mock-token-1-short"), None);
    assert_eq!(token_user_id("bearer-abc"), None);
    assert_eq!(token_user_id(""), None);
}

// =============================================================================
// auth
// =============================================================================

#[test]
fn login_with_fixture_credentials_succeeds() {
    let backend = MockBackend::new();
    let response = backend.login("admin", "admin123");
    assert!(response.success);
    assert!(response.token.as_deref().is_some_and(|t| !t.is_empty()));
    assert_eq!(response.user.map(|u| u.role), Some(Role::Admin));
}

#[test]
fn login_with_wrong_password_is_rejected() {
    let backend = MockBackend::new();
    let response = backend.login("admin", "wrong");
    assert!(!response.success);
    assert_eq!(response.token, None);
    assert_eq!(response.message.as_deref(), Some("Invalid credentials"));
}

#[test]
fn validate_accepts_issued_token_until_logout() {
    let backend = MockBackend::new();
    let token = backend.login("admin", "admin123").token.unwrap();

    assert!(backend.validate(&token).valid);
    backend.logout(&token);
    assert_eq!(backend.validate(&token), ValidateResponse::invalid());
}

#[test]
fn validate_accepts_token_from_another_backend_instance() {
    let token = MockBackend::new().login("admin", "admin123").token.unwrap();
    assert!(MockBackend::new().validate(&token).valid);
}

#[test]
fn validate_rejects_unknown_user() {
    let token = generate_token("999");
    assert!(!MockBackend::new().validate(&token).valid);
}

#[test]
fn extra_account_can_log_in() {
    let editor = Identity { id: "2".to_owned(), username: "editor".to_owned(), role: Role::Editor };
    let backend = MockBackend::new().with_account(editor.clone(), "pw");
    assert_eq!(backend.login("editor", "pw").user, Some(editor));
}

// =============================================================================
// records
// =============================================================================

#[test]
fn seeded_backend_has_every_collection() {
    let backend = MockBackend::seeded();
    for resource in Resource::ALL {
        assert!(!backend.list(resource).is_empty(), "{resource} should have fixtures");
    }
}

#[test]
fn insert_assigns_id_and_ignores_supplied_one() {
    let backend = MockBackend::new();
    let mut fields = Fields::new();
    fields.insert("id".to_owned(), serde_json::json!("forged"));
    fields.insert("title".to_owned(), serde_json::json!("Hello"));

    let record = backend.insert(Resource::Blogs, fields);

    assert_ne!(record.id, "forged");
    assert!(!record.fields.contains_key("id"));
    assert_eq!(backend.get(Resource::Blogs, &record.id), Some(record));
}

#[test]
fn update_merges_fields() {
    let backend = MockBackend::new();
    let mut fields = Fields::new();
    fields.insert("title".to_owned(), serde_json::json!("Old"));
    fields.insert("open".to_owned(), serde_json::json!(true));
    let record = backend.insert(Resource::Careers, fields);

    let mut patch = Fields::new();
    patch.insert("title".to_owned(), serde_json::json!("New"));
    let updated = backend.update(Resource::Careers, &record.id, patch).unwrap();

    assert_eq!(updated.fields.get("title"), Some(&serde_json::json!("New")));
    assert_eq!(updated.fields.get("open"), Some(&serde_json::json!(true)));
}

#[test]
fn update_and_remove_missing_record() {
    let backend = MockBackend::new();
    assert!(backend.update(Resource::Slides, "nope", Fields::new()).is_none());
    assert!(!backend.remove(Resource::Slides, "nope"));
}

#[tokio::test]
async fn mock_record_source_round_trip() {
    let source = MockRecordSource::new(Arc::new(MockBackend::new()));
    let mut fields = Fields::new();
    fields.insert("name".to_owned(), serde_json::json!("Lee"));

    let created = source.create(Resource::Contacts, fields).await.unwrap();
    assert_eq!(source.list(Resource::Contacts).await.unwrap().len(), 1);

    source.delete(Resource::Contacts, &created.id).await.unwrap();
    let err = source.get(Resource::Contacts, &created.id).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 404, .. }));
}

#[tokio::test]
async fn mock_auth_api_logout_revokes_store_credential() {
    let backend = Arc::new(MockBackend::new());
    let store = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
    let api = MockAuthApi::new(backend.clone(), store.clone());

    let response = api.login("admin", "admin123").await.unwrap();
    let token = response.token.clone().unwrap();
    store.establish(crate::state::session::Session::new(response.user.unwrap(), token.clone()).unwrap());

    api.logout().await.unwrap();
    assert!(!api.validate(&token).await.unwrap().valid);
}
