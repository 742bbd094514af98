//! Mock REST server exposing a [`MockBackend`] over the admin API contract.
//!
//! SYSTEM CONTEXT
//! ==============
//! `admin-cli serve-mock` runs this for local work against the HTTP client,
//! and the client tests bind it to an ephemeral port. [`serve`] mounts the
//! routes under [`API_PREFIX`] so the default client base URL reaches them.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::MockBackend;
use crate::net::types::{ErrorBody, Fields, Identity, Resource, ValidateResponse};

/// Path the served API lives under, matching the default client base URL.
pub const API_PREFIX: &str = "/api";

#[derive(Clone)]
struct MockState {
    backend: Arc<MockBackend>,
}

/// Build the mock API router.
pub fn router(backend: Arc<MockBackend>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/validate", get(validate))
        .route("/{resource}", get(list_records).post(create_record))
        .route(
            "/{resource}/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(MockState { backend })
}

/// The mock API router nested under [`API_PREFIX`].
pub fn app(backend: Arc<MockBackend>) -> Router {
    Router::new().nest(API_PREFIX, router(backend))
}

/// Serve the mock API on `listener` until the task is dropped.
///
/// # Errors
///
/// Returns an error if the server fails while accepting connections.
pub async fn serve(listener: tokio::net::TcpListener, backend: Arc<MockBackend>) -> std::io::Result<()> {
    axum::serve(listener, app(backend)).await
}

// =============================================================================
// HELPERS
// =============================================================================

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody { message: message.to_owned() })).into_response()
}

fn authorize(state: &MockState, headers: &HeaderMap) -> Result<Identity, Response> {
    bearer_token(headers)
        .and_then(|token| state.backend.identity_for(token))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Authentication required"))
}

fn parse_resource(raw: &str) -> Result<Resource, Response> {
    raw.parse::<Resource>()
        .map_err(|_| error(StatusCode::NOT_FOUND, "Unknown resource"))
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

/// `POST /auth/login`: always 200; rejection is `success: false`.
async fn login(State(state): State<MockState>, Json(body): Json<LoginBody>) -> Response {
    Json(state.backend.login(&body.username, &body.password)).into_response()
}

async fn logout(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if let Some(token) = bearer_token(&headers) {
        state.backend.logout(token);
    }
    Json(serde_json::json!({ "success": true })).into_response()
}

/// `GET /auth/validate`: an unknown token is `{valid: false}`, not a 401.
async fn validate(State(state): State<MockState>, headers: HeaderMap) -> Response {
    let response = bearer_token(&headers).map_or_else(ValidateResponse::invalid, |t| state.backend.validate(t));
    Json(response).into_response()
}

async fn list_records(State(state): State<MockState>, Path(resource): Path<String>, headers: HeaderMap) -> Response {
    let resource = match parse_resource(&resource) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    Json(state.backend.list(resource)).into_response()
}

async fn create_record(
    State(state): State<MockState>,
    Path(resource): Path<String>,
    headers: HeaderMap,
    Json(fields): Json<Fields>,
) -> Response {
    let resource = match parse_resource(&resource) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    (StatusCode::CREATED, Json(state.backend.insert(resource, fields))).into_response()
}

async fn get_record(
    State(state): State<MockState>,
    Path((resource, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let resource = match parse_resource(&resource) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    match state.backend.get(resource, &id) {
        Some(record) => Json(record).into_response(),
        None => error(StatusCode::NOT_FOUND, "Record not found"),
    }
}

async fn update_record(
    State(state): State<MockState>,
    Path((resource, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(fields): Json<Fields>,
) -> Response {
    let resource = match parse_resource(&resource) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    match state.backend.update(resource, &id, fields) {
        Some(record) => Json(record).into_response(),
        None => error(StatusCode::NOT_FOUND, "Record not found"),
    }
}

async fn delete_record(
    State(state): State<MockState>,
    Path((resource, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let resource = match parse_resource(&resource) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    if state.backend.remove(resource, &id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error(StatusCode::NOT_FOUND, "Record not found")
    }
}
