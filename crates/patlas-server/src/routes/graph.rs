//! Per-record ego graph and two-record bridge path.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::{clamp, error_json, internal_error, parse_or};
use crate::state::AppState;
use patlas_graph::{bridge_path, neighbor_graph, GraphPayload, PatentLink};
use patlas_store::Patent;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/graph/neighbor", get(neighbor))
        .route("/graph/path", get(path))
}

fn to_link(p: &Patent) -> PatentLink {
    PatentLink {
        pub_no: p.pub_no.clone(),
        title: Some(p.title.clone()),
        applicants: p.applicants_current.clone(),
        inventors: p.inventors.clone(),
        ipc_main_prefix: p.ipc_main_prefix.clone(),
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct NeighborParams {
    pub_no: Option<String>,
    limit: Option<String>,
}

/// GET /api/graph/neighbor?pub_no=&limit=50 — one-hop ego graph. An
/// unknown identifier yields an empty graph, not an error.
async fn neighbor(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NeighborParams>,
) -> impl IntoResponse {
    let Some(pub_no) = params.pub_no.filter(|p| !p.trim().is_empty()) else {
        return error_json(StatusCode::BAD_REQUEST, "pub_no_required");
    };
    let limit = clamp(parse_or(params.limit.as_deref(), 50), 1, 200) as usize;

    match state.store.get_patent(&pub_no) {
        Ok(Some(patent)) => Json(neighbor_graph(&to_link(&patent), limit)).into_response(),
        Ok(None) => Json(GraphPayload::default()).into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct PathParams {
    src: Option<String>,
    dst: Option<String>,
}

/// GET /api/graph/path?src=&dst= — zero or one bridge path through a
/// shared organization or IPC domain.
async fn path(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PathParams>,
) -> impl IntoResponse {
    let (Some(src), Some(dst)) = (
        params.src.filter(|s| !s.trim().is_empty()),
        params.dst.filter(|s| !s.trim().is_empty()),
    ) else {
        return error_json(StatusCode::BAD_REQUEST, "src_dst_required");
    };

    let a = match state.store.get_patent(&src) {
        Ok(p) => p,
        Err(e) => return internal_error(e),
    };
    let b = match state.store.get_patent(&dst) {
        Ok(p) => p,
        Err(e) => return internal_error(e),
    };
    let (Some(a), Some(b)) = (a, b) else {
        return Json(serde_json::json!({ "paths": [] })).into_response();
    };

    let paths: Vec<GraphPayload> = bridge_path(&to_link(&a), &to_link(&b)).into_iter().collect();
    Json(serde_json::json!({ "paths": paths })).into_response()
}
