//! Basic flat-filter search.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::{clamp, internal_error, parse_or};
use crate::state::AppState;
use patlas_query::{compile_flat, FlatQuery};
use patlas_store::SearchOrder;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/search", get(search))
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct SearchParams {
    kw: Option<String>,
    #[serde(rename = "yearStart")]
    year_start: Option<String>,
    #[serde(rename = "yearEnd")]
    year_end: Option<String>,
    #[serde(rename = "type")]
    patent_type: Option<String>,
    #[serde(rename = "ipcPrefix")]
    ipc_prefix: Option<String>,
    applicant: Option<String>,
    page: Option<String>,
    #[serde(rename = "pageSize")]
    page_size: Option<String>,
}

impl SearchParams {
    fn filter(&self) -> FlatQuery {
        FlatQuery {
            kw: self.kw.clone(),
            year_start: self.year_start.clone(),
            year_end: self.year_end.clone(),
            patent_type: self.patent_type.clone(),
            ipc_prefix: self.ipc_prefix.clone(),
            applicant: self.applicant.clone(),
        }
    }
}

/// GET /api/search — paginated listing with the flat filter.
async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let page = parse_or(params.page.as_deref(), 1).max(1) as usize;
    let page_size = clamp(parse_or(params.page_size.as_deref(), 20), 1, 100) as usize;

    let pred = compile_flat(&params.filter());
    match state
        .store
        .search_patents(&pred, SearchOrder::PubDateDesc, page, page_size, 120)
    {
        Ok((list, total)) => Json(serde_json::json!({
            "total": total,
            "list": list,
        }))
        .into_response(),
        Err(e) => internal_error(e),
    }
}
