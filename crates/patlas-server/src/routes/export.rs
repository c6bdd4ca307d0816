//! CSV export of the newest records, with task-row bookkeeping.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{error_json, internal_error, require_user};
use crate::state::AppState;
use patlas_store::ExportRow;

/// Rows included in one export.
const EXPORT_ROW_CAP: usize = 1000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/export/request", post(request_export))
        .route("/export/status/{id}", get(export_status))
        .route("/export/download/{id}", get(download))
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ExportRequest {
    tree: Option<serde_json::Value>,
}

fn csv_cell(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn render_csv(rows: &[ExportRow]) -> String {
    let mut out = String::from("pub_no,title,applicants_current,ipc_main,pub_date\n");
    for row in rows {
        let line = [
            row.pub_no.as_str(),
            row.title.as_str(),
            row.applicants_current.as_deref().unwrap_or(""),
            row.ipc_main.as_deref().unwrap_or(""),
            row.pub_date.as_deref().unwrap_or(""),
        ]
        .map(csv_cell)
        .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// POST /api/export/request — creates the task row and generates the CSV
/// synchronously.
async fn request_export(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<ExportRequest>, JsonRejection>,
) -> impl IntoResponse {
    let user = match require_user(&state, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let params_json =
        serde_json::to_string(&serde_json::json!({ "tree": req.tree })).unwrap_or_default();

    let task_id = match state.store.create_export_task(user.id, &params_json) {
        Ok(id) => id,
        Err(e) => return internal_error(e),
    };
    if let Err(e) = state.store.mark_export_task(task_id, "processing", None) {
        return internal_error(e);
    }

    let rows = match state.store.export_rows(EXPORT_ROW_CAP) {
        Ok(rows) => rows,
        Err(e) => {
            let _ = state.store.mark_export_task(task_id, "failed", None);
            return internal_error(e);
        }
    };

    let file_path = state
        .config
        .data_paths
        .exports
        .join(format!("export_{}.csv", task_id));
    if let Err(e) = std::fs::write(&file_path, render_csv(&rows)) {
        let _ = state.store.mark_export_task(task_id, "failed", None);
        tracing::error!("export write failed: {}", e);
        return error_json(StatusCode::INTERNAL_SERVER_ERROR, "internal_error");
    }

    let path_str = file_path.to_string_lossy();
    if let Err(e) = state
        .store
        .mark_export_task(task_id, "done", Some(path_str.as_ref()))
    {
        return internal_error(e);
    }

    Json(serde_json::json!({ "taskId": task_id })).into_response()
}

/// GET /api/export/status/{id}
async fn export_status(
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
    match state.store.get_export_task(id, user.id) {
        Ok(Some(task)) => Json(serde_json::json!({
            "id": task.id,
            "status": task.status,
        }))
        .into_response(),
        Ok(None) => error_json(StatusCode::NOT_FOUND, "not_found"),
        Err(e) => internal_error(e),
    }
}

/// GET /api/export/download/{id} — the finished CSV as an attachment.
async fn download(
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
    let task = match state.store.get_export_task(id, user.id) {
        Ok(Some(task)) => task,
        Ok(None) => return error_json(StatusCode::NOT_FOUND, "not_found"),
        Err(e) => return internal_error(e),
    };
    let Some(file_path) = task.file_path.filter(|_| task.status == "done") else {
        return error_json(StatusCode::BAD_REQUEST, "not_ready");
    };

    match tokio::fs::read(&file_path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=export_{}.csv", id),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(_) => error_json(StatusCode::BAD_REQUEST, "not_ready"),
    }
}
