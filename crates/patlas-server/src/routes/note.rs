//! Per-patent user notes.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{clamp, error_json, internal_error, parse_or, require_user};
use crate::state::AppState;

/// Note bodies are capped server-side.
const MAX_NOTE_CHARS: usize = 4000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/note/create", post(create))
        .route("/note/list", get(list))
        .route("/note/{id}", patch(update).delete(remove))
}

fn truncate_content(content: &str) -> String {
    content.chars().take(MAX_NOTE_CHARS).collect()
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CreateRequest {
    pub_no: String,
    content: String,
}

/// POST /api/note/create
async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<CreateRequest>, JsonRejection>,
) -> impl IntoResponse {
    let user = match require_user(&state, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let req = body.map(|Json(r)| r).unwrap_or_default();
    if req.pub_no.is_empty() || req.content.is_empty() {
        return error_json(StatusCode::BAD_REQUEST, "params_required");
    }
    match state
        .store
        .create_note(user.id, &req.pub_no, &truncate_content(&req.content))
    {
        Ok(_) => Json(serde_json::json!({ "ok": true })).into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ListParams {
    pub_no: Option<String>,
    page: Option<String>,
    #[serde(rename = "pageSize")]
    page_size: Option<String>,
}

/// GET /api/note/list?pub_no=&page=&pageSize=
async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let user = match require_user(&state, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let Some(pub_no) = params.pub_no.filter(|p| !p.is_empty()) else {
        return error_json(StatusCode::BAD_REQUEST, "pub_no_required");
    };
    let page = parse_or(params.page.as_deref(), 1).max(1) as usize;
    let page_size = clamp(parse_or(params.page_size.as_deref(), 50), 1, 100) as usize;

    match state.store.list_notes(user.id, &pub_no, page, page_size) {
        Ok((list, total)) => Json(serde_json::json!({
            "total": total,
            "list": list,
        }))
        .into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct UpdateRequest {
    content: String,
}

/// PATCH /api/note/{id} — empty content is a no-op, not an error.
async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: Result<Json<UpdateRequest>, JsonRejection>,
) -> impl IntoResponse {
    let user = match require_user(&state, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    if id <= 0 {
        return error_json(StatusCode::BAD_REQUEST, "bad_id");
    }
    let req = body.map(|Json(r)| r).unwrap_or_default();
    if req.content.is_empty() {
        return Json(serde_json::json!({ "ok": true })).into_response();
    }
    match state
        .store
        .update_note(user.id, id, &truncate_content(&req.content))
    {
        Ok(_) => Json(serde_json::json!({ "ok": true })).into_response(),
        Err(e) => internal_error(e),
    }
}

/// DELETE /api/note/{id}
async fn remove(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let user = match require_user(&state, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    if id <= 0 {
        return error_json(StatusCode::BAD_REQUEST, "bad_id");
    }
    match state.store.delete_note(user.id, id) {
        Ok(_) => Json(serde_json::json!({ "ok": true })).into_response(),
        Err(e) => internal_error(e),
    }
}
