//! Favorites.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{clamp, error_json, internal_error, parse_or, require_user};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/fav/toggle", post(toggle))
        .route("/fav/list", get(list))
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ToggleRequest {
    pub_no: String,
}

/// POST /api/fav/toggle — flips the favorite state, returns the new one.
async fn toggle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<ToggleRequest>, JsonRejection>,
) -> impl IntoResponse {
    let user = match require_user(&state, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let req = body.map(|Json(r)| r).unwrap_or_default();
    if req.pub_no.is_empty() {
        return error_json(StatusCode::BAD_REQUEST, "pub_no_required");
    }
    match state.store.toggle_favorite(user.id, &req.pub_no) {
        Ok(favored) => Json(serde_json::json!({ "favored": favored })).into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ListParams {
    page: Option<String>,
    #[serde(rename = "pageSize")]
    page_size: Option<String>,
}

/// GET /api/fav/list
async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let user = match require_user(&state, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let page = parse_or(params.page.as_deref(), 1).max(1) as usize;
    let page_size = clamp(parse_or(params.page_size.as_deref(), 20), 1, 100) as usize;

    match state.store.list_favorites(user.id, page, page_size) {
        Ok((list, total)) => Json(serde_json::json!({
            "total": total,
            "list": list,
        }))
        .into_response(),
        Err(e) => internal_error(e),
    }
}
