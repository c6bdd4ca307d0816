//! Per-year statistics endpoints.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::internal_error;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats/domain/applications", get(domain_applications))
        .route("/stats/domain/grant_rate", get(domain_grant_rate))
        .route("/stats/org/count", get(org_count))
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct StatsParams {
    domain: Option<String>,
    org: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

impl StatsParams {
    fn domain(&self) -> Option<&str> {
        self.domain.as_deref().filter(|s| !s.is_empty())
    }

    fn org(&self) -> Option<&str> {
        self.org.as_deref().filter(|s| !s.is_empty())
    }

    fn year(value: Option<&str>) -> Option<i64> {
        value.filter(|s| !s.is_empty())?.trim().parse().ok()
    }

    fn range(&self) -> (Option<i64>, Option<i64>) {
        (
            Self::year(self.from.as_deref()),
            Self::year(self.to.as_deref()),
        )
    }
}

/// GET /api/stats/domain/applications — applications per year.
async fn domain_applications(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> impl IntoResponse {
    let (from, to) = params.range();
    match state.store.domain_applications(params.domain(), from, to) {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /api/stats/domain/grant_rate — grant rate per year.
async fn domain_grant_rate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> impl IntoResponse {
    let (from, to) = params.range();
    match state.store.domain_grant_rate(params.domain(), from, to) {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /api/stats/org/count — one organization's applications per year.
async fn org_count(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> impl IntoResponse {
    let (from, to) = params.range();
    match state.store.org_year_counts(params.org(), from, to) {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => internal_error(e),
    }
}
