//! Single-record lookup and side-by-side compare.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::{error_json, internal_error};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/patent/{pub_no}", get(get_patent))
        .route("/compare", get(compare))
}

/// GET /api/patent/{pub_no} — full record.
async fn get_patent(
    State(state): State<Arc<AppState>>,
    Path(pub_no): Path<String>,
) -> impl IntoResponse {
    match state.store.get_patent(&pub_no) {
        Ok(Some(patent)) => Json(patent).into_response(),
        Ok(None) => error_json(StatusCode::NOT_FOUND, "not_found"),
        Err(e) => internal_error(e),
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CompareParams {
    pub_nos: Option<String>,
}

/// GET /api/compare?pub_nos=CN1,CN2,CN3 — up to three records.
async fn compare(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CompareParams>,
) -> impl IntoResponse {
    let raw = params.pub_nos.unwrap_or_default();
    if raw.trim().is_empty() {
        return error_json(StatusCode::BAD_REQUEST, "pub_nos_required");
    }

    let mut ids: Vec<String> = Vec::new();
    for id in raw.split(|c: char| matches!(c, ',' | '，' | ';' | '；') || c.is_whitespace()) {
        let id = id.trim();
        if !id.is_empty() && !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
    }
    ids.truncate(3);
    if ids.is_empty() {
        return Json(serde_json::json!({ "list": [] })).into_response();
    }

    match state.store.get_patents_by_pub_nos(&ids) {
        Ok(list) => Json(serde_json::json!({ "list": list })).into_response(),
        Err(e) => internal_error(e),
    }
}
