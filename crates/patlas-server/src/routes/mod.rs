//! HTTP route handlers — matches the upstream Express API surface.

pub mod advanced;
pub mod collab;
pub mod export;
pub mod fav;
pub mod graph;
pub mod note;
pub mod patent;
pub mod search;
pub mod stats;
pub mod user;

use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::state::AppState;
use patlas_store::AuthUser;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .merge(search::routes())
        .merge(advanced::routes())
        .merge(patent::routes())
        .merge(graph::routes())
        .merge(collab::routes())
        .merge(stats::routes())
        .merge(user::routes())
        .merge(fav::routes())
        .merge(note::routes())
        .merge(export::routes())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

/// Stable error body shape: `{"error": code}`.
pub(crate) fn error_json(status: StatusCode, code: &str) -> axum::response::Response {
    (status, Json(serde_json::json!({ "error": code }))).into_response()
}

/// Store failures surface uniformly as 500 `internal_error`, logged.
pub(crate) fn internal_error(err: patlas_core::Error) -> axum::response::Response {
    tracing::error!("store failure: {}", err);
    error_json(StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
}

/// Extract the bearer token from an Authorization header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = if header.len() >= 7 && header[..7].eq_ignore_ascii_case("bearer ") {
        header[7..].trim()
    } else {
        header.trim()
    };
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Resolve the session user, or produce the 401 response.
pub(crate) fn require_user(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AuthUser, axum::response::Response> {
    let Some(token) = bearer_token(headers) else {
        return Err(error_json(StatusCode::UNAUTHORIZED, "unauthorized"));
    };
    match state.store.session_user(&token) {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(error_json(StatusCode::UNAUTHORIZED, "unauthorized")),
        Err(e) => Err(internal_error(e)),
    }
}

/// Like `require_user`, additionally gated on the admin role.
pub(crate) fn require_admin(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AuthUser, axum::response::Response> {
    let user = require_user(state, headers)?;
    if user.role != "admin" {
        return Err(error_json(StatusCode::FORBIDDEN, "forbidden"));
    }
    Ok(user)
}

/// Lenient integer parse with a fallback, for query-string numbers.
pub(crate) fn parse_or(value: Option<&str>, default: i64) -> i64 {
    value
        .map(str::trim)
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(default)
}

/// Server-side clamp applied to every client-supplied resource lever.
pub(crate) fn clamp(value: i64, lo: i64, hi: i64) -> i64 {
    value.max(lo).min(hi)
}
