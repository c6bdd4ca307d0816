//! Collaboration-graph endpoints: organization and inventor co-occurrence
//! over a filtered record sample.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::{clamp, internal_error, parse_or};
use crate::state::AppState;
use patlas_graph::{aggregate, CollabLimits, EntityList};
use patlas_query::{compile_flat, FlatQuery};
use patlas_store::EntityField;

/// Per-record entity cap fed into the extractor; bounds the quadratic
/// pairing cost per sampled row.
const EXTRACT_LIMIT: usize = 20;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/graph/org_collab", get(org_collab))
        .route("/graph/inventor_collab", get(inventor_collab))
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CollabParams {
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
    #[serde(rename = "topN")]
    top_n: Option<String>,
    #[serde(rename = "minWeight")]
    min_weight: Option<String>,
    #[serde(rename = "sampleLimit")]
    sample_limit: Option<String>,
}

impl CollabParams {
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

    /// All three levers are clamped server-side regardless of what the
    /// client sent.
    fn limits(&self, top_n_max: i64, default_sample: i64) -> (CollabLimits, usize) {
        let top_n = clamp(parse_or(self.top_n.as_deref(), 100), 10, top_n_max) as usize;
        let min_weight = clamp(parse_or(self.min_weight.as_deref(), 1), 1, 1000) as u32;
        let sample_limit =
            clamp(parse_or(self.sample_limit.as_deref(), default_sample), 100, 20000) as usize;
        (
            CollabLimits {
                top_n,
                min_weight,
                extract_limit: EXTRACT_LIMIT,
            },
            sample_limit,
        )
    }
}

/// GET /api/graph/org_collab — applicant co-occurrence graph.
async fn org_collab(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CollabParams>,
) -> impl IntoResponse {
    let (limits, sample_limit) = params.limits(300, state.config.default_sample_limit as i64);
    let pred = compile_flat(&params.filter());
    match state
        .store
        .collab_fields(&pred, EntityField::Applicants, sample_limit)
    {
        Ok(rows) => {
            Json(aggregate(&rows, EntityList::Organizations, &limits)).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// GET /api/graph/inventor_collab — inventor co-occurrence graph.
async fn inventor_collab(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CollabParams>,
) -> impl IntoResponse {
    let (limits, sample_limit) = params.limits(400, state.config.default_sample_limit as i64);
    let pred = compile_flat(&params.filter());
    match state
        .store
        .collab_fields(&pred, EntityField::Inventors, sample_limit)
    {
        Ok(rows) => Json(aggregate(&rows, EntityList::Inventors, &limits)).into_response(),
        Err(e) => internal_error(e),
    }
}
