//! Row types for patents, search results, and account records.

use serde::{Deserialize, Serialize};

/// A full patent row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patent {
    pub id: i64,
    pub pub_no: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_no: Option<String>,
    pub title: String,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventor_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicants_current: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicants_current_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipc_main: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipc_main_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_patent_citations: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cited_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cites: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patsnap_family_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patent_type: Option<String>,
    pub grant_flag: i64,
}

/// A search result row: summary columns plus a bounded abstract snippet.
#[derive(Debug, Clone, Serialize)]
pub struct PatentSummary {
    pub pub_no: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_no: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abstract_snippet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicants_current: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patent_type: Option<String>,
    pub grant_flag: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipc_main: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipc_main_prefix: Option<String>,
}

/// Insert/upsert input for one patent record.
#[derive(Debug, Clone, Default)]
pub struct PatentRecord {
    pub pub_no: String,
    pub app_no: Option<String>,
    pub title: String,
    pub abstract_text: Option<String>,
    pub app_date: Option<String>,
    pub pub_date: Option<String>,
    pub inventors: Option<String>,
    pub inventor_count: Option<i64>,
    pub applicants_current: Option<String>,
    pub applicants_current_count: Option<i64>,
    pub ipc: Option<String>,
    pub ipc_main: Option<String>,
    pub ipc_main_prefix: Option<String>,
    pub non_patent_citations: Option<i64>,
    pub legal_status: Option<String>,
    pub cited_by: Option<String>,
    pub cites: Option<String>,
    pub apply_year: Option<i64>,
    pub patsnap_family_count: Option<i64>,
    pub office: Option<String>,
    pub patent_type: Option<String>,
    pub grant_flag: i64,
}

/// Result ordering for paginated search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOrder {
    PubDateDesc,
    YearDesc,
    YearAsc,
}

impl SearchOrder {
    /// Unknown order parameters fall back to newest-first by date.
    pub fn from_param(value: &str) -> Self {
        match value {
            "year_desc" => SearchOrder::YearDesc,
            "year_asc" => SearchOrder::YearAsc,
            _ => SearchOrder::PubDateDesc,
        }
    }

    pub(crate) fn sql(self) -> &'static str {
        match self {
            SearchOrder::PubDateDesc => "ORDER BY pub_date DESC",
            SearchOrder::YearDesc => "ORDER BY apply_year DESC",
            SearchOrder::YearAsc => "ORDER BY apply_year ASC",
        }
    }
}

/// Authenticated user identity attached to a session.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub role: String,
}

/// Admin-facing user listing row.
#[derive(Debug, Clone, Serialize)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: String,
    pub status: i64,
    pub created_at: i64,
}

/// Partial update for an admin user edit.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub status: Option<i64>,
}

/// One favorites listing row, joined with patent summary columns.
#[derive(Debug, Clone, Serialize)]
pub struct FavoriteItem {
    pub pub_no: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipc_main: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<String>,
}

/// One note listing row.
#[derive(Debug, Clone, Serialize)]
pub struct NoteItem {
    pub id: i64,
    pub content: String,
    pub updated_at: i64,
}

/// Export task bookkeeping row.
#[derive(Debug, Clone, Serialize)]
pub struct ExportTask {
    pub id: i64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

/// Columns used by the CSV export.
#[derive(Debug, Clone)]
pub struct ExportRow {
    pub pub_no: String,
    pub title: String,
    pub applicants_current: Option<String>,
    pub ipc_main: Option<String>,
    pub pub_date: Option<String>,
}

/// Per-year application count.
#[derive(Debug, Clone, Serialize)]
pub struct YearCount {
    pub year: Option<i64>,
    pub count: i64,
}

/// Per-year grant rate.
#[derive(Debug, Clone, Serialize)]
pub struct YearRate {
    pub year: Option<i64>,
    #[serde(rename = "grantRate")]
    pub grant_rate: f64,
}
