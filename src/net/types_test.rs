use super::*;

#[test]
fn identity_accepts_numeric_id() {
    let identity: Identity = serde_json::from_str(r#"{"id":1,"username":"admin","role":"admin"}"#).unwrap();
    assert_eq!(identity.id, "1");
    assert_eq!(identity.role, Role::Admin);
}

#[test]
fn identity_unknown_role_becomes_other() {
    let identity: Identity = serde_json::from_str(r#"{"id":"9","username":"x","role":"superuser"}"#).unwrap();
    assert_eq!(identity.role, Role::Other);
}

#[test]
fn identity_serializes_storage_shape() {
    let identity = Identity { id: "1".to_owned(), username: "admin".to_owned(), role: Role::Admin };
    let json = serde_json::to_value(&identity).unwrap();
    assert_eq!(json, serde_json::json!({"id": "1", "username": "admin", "role": "admin"}));
}

#[test]
fn login_response_rejection_omits_user_and_token() {
    let parsed: LoginResponse =
        serde_json::from_str(r#"{"success":false,"message":"Invalid credentials"}"#).unwrap();
    assert_eq!(parsed, LoginResponse::rejected("Invalid credentials"));
}

#[test]
fn validate_response_without_user() {
    let parsed: ValidateResponse = serde_json::from_str(r#"{"valid":false}"#).unwrap();
    assert_eq!(parsed, ValidateResponse::invalid());
}

#[test]
fn resource_paths() {
    assert_eq!(Resource::Slides.collection_path(), "/slides");
    assert_eq!(Resource::Careers.item_path("7"), "/careers/7");
}

#[test]
fn item_path_keeps_id_in_one_segment() {
    assert_eq!(Resource::Slides.item_path("a/b?c#d"), "/slides/a%2Fb%3Fc%23d");
    assert_eq!(Resource::Blogs.item_path("100%"), "/blogs/100%25");
}

#[test]
fn resource_from_str_round_trips_all() {
    for resource in Resource::ALL {
        assert_eq!(resource.as_str().parse::<Resource>().unwrap(), resource);
    }
    assert!("users".parse::<Resource>().is_err());
}

#[test]
fn record_flattens_fields() {
    let record: Record = serde_json::from_str(r#"{"id":3,"title":"Hello","published":true}"#).unwrap();
    assert_eq!(record.id, "3");
    assert_eq!(record.fields.get("title"), Some(&serde_json::json!("Hello")));
    assert!(!record.fields.contains_key("id"));
}

#[test]
fn transport_errors_are_classified() {
    assert!(ApiError::Timeout.is_transport());
    assert!(ApiError::Transport("reset".to_owned()).is_transport());
    assert!(!ApiError::Unauthorized.is_transport());
    assert!(!ApiError::Status { status: 500, body: String::new() }.is_transport());
}

#[test]
fn unauthorized_is_not_retryable() {
    assert!(!ApiError::Unauthorized.retryable());
    assert!(ApiError::Status { status: 503, body: String::new() }.retryable());
    assert_eq!(ApiError::Unauthorized.error_code(), "E_UNAUTHORIZED");
}
