//! CSV import of patent records.
//!
//! Reads a header-mapped CSV file and upserts one patent row per record.
//! Derived columns (patent type, IPC prefix, grant flag, normalized
//! applicant list) are computed here so the stored corpus is uniform
//! regardless of the export tool that produced the file.

use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use patlas_core::{Error, Result};
use patlas_store::normalize::{
    derive_grant_flag, derive_ipc_prefix, derive_patent_type, normalize_applicants,
    parse_flexible_date,
};
use patlas_store::{PatentRecord, PatentStore};

/// Result of one import run.
#[derive(Debug)]
pub struct ImportReport {
    pub rows_read: usize,
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Import a CSV file into the store. Rows without a publication number
/// are skipped; store failures are collected per row.
pub fn run_import(csv_path: &Path, store: &PatentStore) -> Result<ImportReport> {
    let content = std::fs::read_to_string(csv_path)
        .map_err(|e| Error::Import(format!("Cannot read {}: {}", csv_path.display(), e)))?;

    let mut rows = parse_csv(&content).into_iter();
    let header = rows
        .next()
        .ok_or_else(|| Error::Import("Empty CSV file".to_string()))?;
    let columns: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_lowercase(), i))
        .collect();
    if !columns.contains_key("pub_no") {
        return Err(Error::Import("CSV header is missing pub_no".to_string()));
    }

    let mut report = ImportReport {
        rows_read: 0,
        imported: 0,
        skipped: 0,
        errors: Vec::new(),
    };

    for row in rows {
        report.rows_read += 1;
        let field = |name: &str| -> Option<String> {
            columns
                .get(name)
                .and_then(|&i| row.get(i))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let Some(pub_no) = field("pub_no") else {
            report.skipped += 1;
            continue;
        };

        let app_date = field("app_date").and_then(|d| parse_flexible_date(&d));
        let apply_year = field("apply_year")
            .and_then(|y| y.parse::<i64>().ok())
            .or_else(|| {
                app_date
                    .as_deref()
                    .and_then(|d| d[..4].parse::<i64>().ok())
            });
        let ipc_main = field("ipc_main");

        let record = PatentRecord {
            patent_type: derive_patent_type(&pub_no).map(str::to_string),
            ipc_main_prefix: ipc_main.as_deref().and_then(derive_ipc_prefix),
            grant_flag: field("legal_status")
                .as_deref()
                .map(derive_grant_flag)
                .unwrap_or(0),
            applicants_current: field("applicants_current")
                .as_deref()
                .and_then(normalize_applicants),
            pub_no: pub_no.clone(),
            app_no: field("app_no"),
            title: field("title").unwrap_or_default(),
            abstract_text: field("abstract"),
            app_date,
            pub_date: field("pub_date").and_then(|d| parse_flexible_date(&d)),
            inventors: field("inventors"),
            inventor_count: field("inventor_count").and_then(|v| v.parse().ok()),
            applicants_current_count: field("applicants_current_count")
                .and_then(|v| v.parse().ok()),
            ipc: field("ipc"),
            ipc_main,
            non_patent_citations: field("non_patent_citations").and_then(|v| v.parse().ok()),
            legal_status: field("legal_status"),
            cited_by: field("cited_by"),
            cites: field("cites"),
            apply_year,
            patsnap_family_count: field("patsnap_family_count").and_then(|v| v.parse().ok()),
            office: field("office"),
        };

        match store.upsert_patent(&record) {
            Ok(()) => {
                report.imported += 1;
                if report.imported % 500 == 0 {
                    info!("Imported {} rows...", report.imported);
                }
            }
            Err(e) => report.errors.push(format!("{}: {}", pub_no, e)),
        }
    }

    Ok(report)
}

pub fn print_report(report: &ImportReport) {
    println!("Rows read:  {}", report.rows_read);
    println!("Imported:   {}", report.imported);
    println!("Skipped:    {}", report.skipped);
    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  {}", err);
        }
    }
}

/// Minimal CSV reader: comma-separated, double-quote quoting with `""`
/// escapes, quoted fields may span lines. Blank records are dropped.
fn parse_csv(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                c => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => {
                record.push(std::mem::take(&mut field));
            }
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push(std::mem::take(&mut record));
                } else {
                    record.clear();
                }
            }
            c => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}
