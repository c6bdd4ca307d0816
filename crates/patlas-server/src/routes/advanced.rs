//! Advanced search over a client-supplied filter tree.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use super::{clamp, internal_error};
use crate::state::AppState;
use patlas_query::{compile, FilterTree};
use patlas_store::SearchOrder;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/advanced/search", post(advanced_search))
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct AdvancedSearchRequest {
    tree: Option<serde_json::Value>,
    page: Option<serde_json::Value>,
    #[serde(rename = "pageSize")]
    page_size: Option<serde_json::Value>,
    #[serde(rename = "orderBy")]
    order_by: Option<String>,
}

/// JSON bodies send page numbers as either numbers or strings.
fn int_value(value: Option<&serde_json::Value>, default: i64) -> i64 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().unwrap_or(default),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

/// POST /api/advanced/search — `{tree, page, pageSize, orderBy}`.
///
/// The tree is parsed leniently: anything that does not deserialize as a
/// filter tree compiles to match-everything. A missing or malformed body
/// behaves like an empty one.
async fn advanced_search(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AdvancedSearchRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = body.map(|Json(r)| r).unwrap_or_default();

    let page = int_value(req.page.as_ref(), 1).max(1) as usize;
    let page_size = clamp(int_value(req.page_size.as_ref(), 20), 1, 100) as usize;
    let order = SearchOrder::from_param(req.order_by.as_deref().unwrap_or(""));

    let tree = req.tree.as_ref().and_then(FilterTree::from_json);
    let pred = compile(tree.as_ref());

    match state
        .store
        .search_patents(&pred, order, page, page_size, 160)
    {
        Ok((list, total)) => Json(serde_json::json!({
            "total": total,
            "list": list,
        }))
        .into_response(),
        Err(e) => internal_error(e),
    }
}
