//! SQLite patent store: corpus CRUD, predicate search, graph-field
//! sampling, and per-year statistics.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use tracing::info;

use crate::schema::{FTS_SCHEMA_SQL, FTS_TRIGGERS_SQL, SCHEMA_SQL};
use crate::types::*;
use patlas_core::{Error, Result};
use patlas_query::CompiledPredicate;

/// Which delimited entity column a collaboration aggregation samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityField {
    Applicants,
    Inventors,
}

impl EntityField {
    fn column(self) -> &'static str {
        match self {
            EntityField::Applicants => "applicants_current",
            EntityField::Inventors => "inventors",
        }
    }
}

/// SQLite store guarding a single connection. Request handlers share the
/// store through `Arc`; statement reuse goes through `prepare_cached`.
pub struct PatentStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl PatentStore {
    /// Open or create the store. `db_dir` is the directory; the file will
    /// be `db_dir/patlas.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("patlas.db");

        let conn = Self::create_connection(&db_path)?;
        Self::init_schema(&conn)?;
        Self::seed_root_admin(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        let patent_count = store.count_patents()?;
        info!(
            "PatentStore initialized: {} patents, path={}",
            patent_count,
            store.db_path.display()
        );

        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA cache_size = -65536;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        let full_schema = format!("{}\n{}\n{}", SCHEMA_SQL, FTS_SCHEMA_SQL, FTS_TRIGGERS_SQL);
        conn.execute_batch(&full_schema)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    // ---------------------------------------------------------------
    // Patent CRUD
    // ---------------------------------------------------------------

    /// Insert a patent record, updating the mutable columns when the
    /// publication number already exists.
    pub fn upsert_patent(&self, rec: &PatentRecord) -> Result<()> {
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO patents (
                pub_no, app_no, title, abstract, app_date, pub_date,
                inventors, inventor_count, applicants_current, applicants_current_count,
                ipc, ipc_main, ipc_main_prefix, non_patent_citations, legal_status,
                cited_by, cites, apply_year, patsnap_family_count, office,
                patent_type, grant_flag
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)
            ON CONFLICT(pub_no) DO UPDATE SET
                title = excluded.title,
                abstract = excluded.abstract,
                pub_date = excluded.pub_date,
                applicants_current = excluded.applicants_current,
                ipc_main = excluded.ipc_main,
                ipc_main_prefix = excluded.ipc_main_prefix,
                patent_type = excluded.patent_type,
                grant_flag = excluded.grant_flag",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![
            rec.pub_no,
            rec.app_no,
            rec.title,
            rec.abstract_text,
            rec.app_date,
            rec.pub_date,
            rec.inventors,
            rec.inventor_count,
            rec.applicants_current,
            rec.applicants_current_count,
            rec.ipc,
            rec.ipc_main,
            rec.ipc_main_prefix,
            rec.non_patent_citations,
            rec.legal_status,
            rec.cited_by,
            rec.cites,
            rec.apply_year,
            rec.patsnap_family_count,
            rec.office,
            rec.patent_type,
            rec.grant_flag,
        ])
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    /// Get a patent by publication number.
    pub fn get_patent(&self, pub_no: &str) -> Result<Option<Patent>> {
        let conn = self.conn.lock();
        let result = conn
            .prepare_cached("SELECT * FROM patents WHERE pub_no = ?1 LIMIT 1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![pub_no], Self::row_to_patent)
            .optional()
            .map_err(|e| Error::Database(e.to_string()));
        result
    }

    /// Fetch full rows for a small set of publication numbers.
    pub fn get_patents_by_pub_nos(&self, pub_nos: &[String]) -> Result<Vec<Patent>> {
        if pub_nos.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders: Vec<String> = (1..=pub_nos.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "SELECT * FROM patents WHERE pub_no IN ({})",
            placeholders.join(",")
        );
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(pub_nos), Self::row_to_patent)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn count_patents(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(1) FROM patents", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }

    // ---------------------------------------------------------------
    // Predicate search
    // ---------------------------------------------------------------

    /// Run a compiled predicate with pagination. Returns `(rows, total)`.
    /// `snippet_len` bounds the abstract excerpt carried per row.
    pub fn search_patents(
        &self,
        pred: &CompiledPredicate,
        order: SearchOrder,
        page: usize,
        page_size: usize,
        snippet_len: usize,
    ) -> Result<(Vec<PatentSummary>, i64)> {
        let conn = self.conn.lock();

        let count_sql = format!("SELECT COUNT(1) FROM patents WHERE {}", pred.sql());
        let total: i64 = conn
            .prepare(&count_sql)
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(&pred.bind_args()[..], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;

        let offset = page.saturating_sub(1) * page_size;
        let list_sql = format!(
            "SELECT pub_no, app_no, title, substr(abstract, 1, {}) AS abstract_snippet, \
             apply_year, pub_date, applicants_current, patent_type, grant_flag, \
             ipc_main, ipc_main_prefix \
             FROM patents WHERE {} {} LIMIT :limit OFFSET :offset",
            snippet_len,
            pred.sql(),
            order.sql()
        );
        let limit_arg = page_size as i64;
        let offset_arg = offset as i64;
        let mut args = pred.bind_args();
        args.push((":limit", &limit_arg));
        args.push((":offset", &offset_arg));

        let mut stmt = conn
            .prepare(&list_sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(&args[..], Self::row_to_summary)
            .map_err(|e| Error::Database(e.to_string()))?;
        let list: Vec<PatentSummary> = rows.filter_map(|r| r.ok()).collect();

        Ok((list, total))
    }

    /// Sample `(pub_no, entity list field)` pairs for collaboration
    /// aggregation, bounded by `sample_limit`.
    pub fn collab_fields(
        &self,
        pred: &CompiledPredicate,
        field: EntityField,
        sample_limit: usize,
    ) -> Result<Vec<(String, Option<String>)>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT pub_no, {} FROM patents WHERE {} LIMIT :lim",
            field.column(),
            pred.sql()
        );
        let lim_arg = sample_limit as i64;
        let mut args = pred.bind_args();
        args.push((":lim", &lim_arg));

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(&args[..], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // ---------------------------------------------------------------
    // Statistics
    // ---------------------------------------------------------------

    /// Applications per year, optionally filtered by IPC domain prefix and
    /// year range.
    pub fn domain_applications(
        &self,
        domain: Option<&str>,
        from: Option<i64>,
        to: Option<i64>,
    ) -> Result<Vec<YearCount>> {
        let (where_sql, args) = Self::stats_where(
            domain
                .as_ref()
                .map(|d| ("ipc_main_prefix = :ipc", ":ipc", d as &dyn ToSql)),
            from.as_ref(),
            to.as_ref(),
        );
        let sql = format!(
            "SELECT apply_year AS year, COUNT(1) AS count FROM patents {} \
             GROUP BY apply_year ORDER BY apply_year",
            where_sql
        );
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(&args[..], |row| {
                Ok(YearCount {
                    year: row.get(0)?,
                    count: row.get(1)?,
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Grant rate per year for a domain.
    pub fn domain_grant_rate(
        &self,
        domain: Option<&str>,
        from: Option<i64>,
        to: Option<i64>,
    ) -> Result<Vec<YearRate>> {
        let (where_sql, args) = Self::stats_where(
            domain
                .as_ref()
                .map(|d| ("ipc_main_prefix = :ipc", ":ipc", d as &dyn ToSql)),
            from.as_ref(),
            to.as_ref(),
        );
        let sql = format!(
            "SELECT apply_year AS year, \
             CAST(SUM(CASE WHEN grant_flag = 1 THEN 1 ELSE 0 END) AS REAL) / COUNT(1) AS grant_rate \
             FROM patents {} GROUP BY apply_year ORDER BY apply_year",
            where_sql
        );
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(&args[..], |row| {
                Ok(YearRate {
                    year: row.get(0)?,
                    grant_rate: row.get::<_, Option<f64>>(1)?.unwrap_or(0.0),
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Applications per year for one organization. Membership is tested
    /// against the delimiter-normalized applicant list.
    pub fn org_year_counts(
        &self,
        org: Option<&str>,
        from: Option<i64>,
        to: Option<i64>,
    ) -> Result<Vec<YearCount>> {
        let org_clause = "instr(',' || replace(replace(replace(replace(applicants_current, ' ', ','), ';', ','), '、', ','), '|', ',') || ',', ',' || :org || ',') > 0";
        let (where_sql, args) =
            Self::stats_where(org.as_ref().map(|o| (org_clause, ":org", o as &dyn ToSql)), from.as_ref(), to.as_ref());
        let sql = format!(
            "SELECT apply_year AS year, COUNT(1) AS count FROM patents {} \
             GROUP BY apply_year ORDER BY apply_year",
            where_sql
        );
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(&args[..], |row| {
                Ok(YearCount {
                    year: row.get(0)?,
                    count: row.get(1)?,
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    fn stats_where<'a>(
        text_filter: Option<(&'static str, &'static str, &'a dyn ToSql)>,
        from: Option<&'a i64>,
        to: Option<&'a i64>,
    ) -> (String, Vec<(&'static str, &'a dyn ToSql)>) {
        let mut clauses: Vec<&'static str> = Vec::new();
        let mut args: Vec<(&'static str, &'a dyn ToSql)> = Vec::new();
        if let Some((clause, name, value)) = text_filter {
            clauses.push(clause);
            args.push((name, value));
        }
        if let Some(from) = from {
            clauses.push("apply_year >= :from_year");
            args.push((":from_year", from as &dyn ToSql));
        }
        if let Some(to) = to {
            clauses.push("apply_year <= :to_year");
            args.push((":to_year", to as &dyn ToSql));
        }
        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        (where_sql, args)
    }

    // ---------------------------------------------------------------
    // Export
    // ---------------------------------------------------------------

    /// Newest records for CSV export, capped by `limit`.
    pub fn export_rows(&self, limit: usize) -> Result<Vec<ExportRow>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT pub_no, title, applicants_current, ipc_main, pub_date \
                 FROM patents ORDER BY pub_date DESC LIMIT ?1",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(ExportRow {
                    pub_no: row.get(0)?,
                    title: row.get(1)?,
                    applicants_current: row.get(2)?,
                    ipc_main: row.get(3)?,
                    pub_date: row.get(4)?,
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // ---------------------------------------------------------------
    // Row mapping
    // ---------------------------------------------------------------

    fn row_to_patent(row: &Row<'_>) -> rusqlite::Result<Patent> {
        Ok(Patent {
            id: row.get("id")?,
            pub_no: row.get("pub_no")?,
            app_no: row.get("app_no")?,
            title: row.get("title")?,
            abstract_text: row.get("abstract")?,
            app_date: row.get("app_date")?,
            pub_date: row.get("pub_date")?,
            inventors: row.get("inventors")?,
            inventor_count: row.get("inventor_count")?,
            applicants_current: row.get("applicants_current")?,
            applicants_current_count: row.get("applicants_current_count")?,
            ipc: row.get("ipc")?,
            ipc_main: row.get("ipc_main")?,
            ipc_main_prefix: row.get("ipc_main_prefix")?,
            non_patent_citations: row.get("non_patent_citations")?,
            legal_status: row.get("legal_status")?,
            cited_by: row.get("cited_by")?,
            cites: row.get("cites")?,
            apply_year: row.get("apply_year")?,
            patsnap_family_count: row.get("patsnap_family_count")?,
            office: row.get("office")?,
            patent_type: row.get("patent_type")?,
            grant_flag: row.get("grant_flag")?,
        })
    }

    fn row_to_summary(row: &Row<'_>) -> rusqlite::Result<PatentSummary> {
        Ok(PatentSummary {
            pub_no: row.get("pub_no")?,
            app_no: row.get("app_no")?,
            title: row.get("title")?,
            abstract_snippet: row.get("abstract_snippet")?,
            apply_year: row.get("apply_year")?,
            pub_date: row.get("pub_date")?,
            applicants_current: row.get("applicants_current")?,
            patent_type: row.get("patent_type")?,
            grant_flag: row.get("grant_flag")?,
            ipc_main: row.get("ipc_main")?,
            ipc_main_prefix: row.get("ipc_main_prefix")?,
        })
    }

    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock();
        f(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patlas_query::{compile, compile_flat, FilterTree, FlatQuery};

    fn open_store() -> (tempfile::TempDir, PatentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PatentStore::open(dir.path()).unwrap();
        (dir, store)
    }

    fn sample(pub_no: &str, title: &str, year: i64) -> PatentRecord {
        PatentRecord {
            pub_no: pub_no.to_string(),
            title: title.to_string(),
            abstract_text: Some(format!("Abstract for {}", title)),
            pub_date: Some(format!("{}-06-01", year)),
            apply_year: Some(year),
            applicants_current: Some("Acme Institute".to_string()),
            inventors: Some("Zhang San,Li Si".to_string()),
            ipc_main: Some("A01B 1/00".to_string()),
            ipc_main_prefix: Some("A01B".to_string()),
            patent_type: Some("invention".to_string()),
            grant_flag: 1,
            ..Default::default()
        }
    }

    fn tree(v: serde_json::Value) -> FilterTree {
        FilterTree::from_json(&v).unwrap()
    }

    #[test]
    fn upsert_then_get_round_trip() {
        let (_dir, store) = open_store();
        store.upsert_patent(&sample("CN1A", "Soil sensor", 2019)).unwrap();
        let p = store.get_patent("CN1A").unwrap().unwrap();
        assert_eq!(p.title, "Soil sensor");
        assert_eq!(p.apply_year, Some(2019));
        assert!(store.get_patent("CN404").unwrap().is_none());
    }

    #[test]
    fn upsert_updates_existing_row() {
        let (_dir, store) = open_store();
        store.upsert_patent(&sample("CN1A", "Old title", 2019)).unwrap();
        store.upsert_patent(&sample("CN1A", "New title", 2019)).unwrap();
        assert_eq!(store.count_patents().unwrap(), 1);
        let p = store.get_patent("CN1A").unwrap().unwrap();
        assert_eq!(p.title, "New title");
    }

    #[test]
    fn null_tree_equals_unfiltered_listing() {
        let (_dir, store) = open_store();
        for i in 0..5 {
            store
                .upsert_patent(&sample(&format!("CN{}A", i), "Widget", 2015 + i))
                .unwrap();
        }
        let pred = compile(None);
        let (list, total) = store
            .search_patents(&pred, SearchOrder::PubDateDesc, 1, 20, 160)
            .unwrap();
        assert_eq!(total, 5);
        assert_eq!(list.len(), 5);
        // Default order is pub_date descending.
        assert_eq!(list[0].pub_no, "CN4A");
    }

    #[test]
    fn keyword_predicate_matches_title_and_abstract() {
        let (_dir, store) = open_store();
        store.upsert_patent(&sample("CN1A", "Soil moisture sensor", 2018)).unwrap();
        store.upsert_patent(&sample("CN2A", "Harvester blade", 2018)).unwrap();

        let t = tree(serde_json::json!({"rules": [{"field": "kw", "value": "moisture"}]}));
        let pred = compile(Some(&t));
        let (list, total) = store
            .search_patents(&pred, SearchOrder::PubDateDesc, 1, 20, 160)
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(list[0].pub_no, "CN1A");
    }

    #[test]
    fn keyword_substring_arm_matches_partial_tokens() {
        let (_dir, store) = open_store();
        store.upsert_patent(&sample("CN1A", "Microirrigation", 2018)).unwrap();
        // FTS tokenizes whole words; the LIKE arm still hits substrings.
        let t = tree(serde_json::json!({"rules": [{"field": "kw", "value": "croirrig"}]}));
        let (_, total) = store
            .search_patents(&compile(Some(&t)), SearchOrder::PubDateDesc, 1, 20, 160)
            .unwrap();
        assert_eq!(total, 1);
    }

    #[test]
    fn year_range_and_ordering() {
        let (_dir, store) = open_store();
        for (i, year) in [2012, 2015, 2018, 2021].iter().enumerate() {
            store
                .upsert_patent(&sample(&format!("CN{}A", i), "Widget", *year))
                .unwrap();
        }
        let t = tree(serde_json::json!({
            "rules": [
                {"field": "apply_year", "op": ">=", "value": 2015},
                {"field": "apply_year", "op": "<=", "value": 2018},
            ]
        }));
        let (list, total) = store
            .search_patents(&compile(Some(&t)), SearchOrder::YearAsc, 1, 20, 160)
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(list[0].apply_year, Some(2015));
        assert_eq!(list[1].apply_year, Some(2018));
    }

    #[test]
    fn non_numeric_year_filter_matches_everything() {
        let (_dir, store) = open_store();
        store.upsert_patent(&sample("CN1A", "Widget", 2018)).unwrap();
        let t = tree(serde_json::json!({
            "rules": [{"field": "apply_year", "op": ">=", "value": "abc"}]
        }));
        let (_, total) = store
            .search_patents(&compile(Some(&t)), SearchOrder::PubDateDesc, 1, 20, 160)
            .unwrap();
        assert_eq!(total, 1);
    }

    #[test]
    fn regrouping_same_logic_preserves_matches() {
        let (_dir, store) = open_store();
        for i in 0..6 {
            let mut rec = sample(&format!("CN{}A", i), "Widget", 2010 + i);
            if i % 2 == 0 {
                rec.patent_type = Some("design".to_string());
            }
            store.upsert_patent(&rec).unwrap();
        }
        let flat = tree(serde_json::json!({
            "rules": [
                {"field": "apply_year", "op": ">=", "value": 2011},
                {"field": "apply_year", "op": "<=", "value": 2014},
                {"field": "patent_type", "value": "design"},
            ]
        }));
        let nested = tree(serde_json::json!({
            "rules": [
                {"field": "apply_year", "op": ">=", "value": 2011},
                {"logic": "AND", "rules": [
                    {"field": "apply_year", "op": "<=", "value": 2014},
                    {"field": "patent_type", "value": "design"},
                ]},
            ]
        }));
        let (_, flat_total) = store
            .search_patents(&compile(Some(&flat)), SearchOrder::PubDateDesc, 1, 20, 160)
            .unwrap();
        let (_, nested_total) = store
            .search_patents(&compile(Some(&nested)), SearchOrder::PubDateDesc, 1, 20, 160)
            .unwrap();
        assert_eq!(flat_total, nested_total);
        assert_eq!(flat_total, 2); // 2012, 2014
    }

    #[test]
    fn or_tree_unions_branches() {
        let (_dir, store) = open_store();
        let mut a = sample("CN1A", "Alpha", 2010);
        a.ipc_main_prefix = Some("A01B".to_string());
        let mut b = sample("CN2A", "Beta", 2020);
        b.ipc_main_prefix = Some("G06F".to_string());
        store.upsert_patent(&a).unwrap();
        store.upsert_patent(&b).unwrap();

        let t = tree(serde_json::json!({
            "logic": "OR",
            "rules": [
                {"field": "ipc_prefix", "value": "A01"},
                {"field": "ipc_prefix", "value": "G06"},
            ]
        }));
        let (_, total) = store
            .search_patents(&compile(Some(&t)), SearchOrder::PubDateDesc, 1, 20, 160)
            .unwrap();
        assert_eq!(total, 2);
    }

    #[test]
    fn pagination_and_snippet_length() {
        let (_dir, store) = open_store();
        for i in 0..25 {
            let mut rec = sample(&format!("CN{:02}A", i), "Widget", 2000 + i);
            rec.abstract_text = Some("x".repeat(500));
            store.upsert_patent(&rec).unwrap();
        }
        let pred = compile(None);
        let (page2, total) = store
            .search_patents(&pred, SearchOrder::YearAsc, 2, 10, 120)
            .unwrap();
        assert_eq!(total, 25);
        assert_eq!(page2.len(), 10);
        assert_eq!(page2[0].apply_year, Some(2010));
        assert_eq!(page2[0].abstract_snippet.as_ref().unwrap().len(), 120);
    }

    #[test]
    fn flat_type_list_membership() {
        let (_dir, store) = open_store();
        for (i, ty) in ["invention", "design", "utility_model"].iter().enumerate() {
            let mut rec = sample(&format!("CN{}A", i), "Widget", 2015);
            rec.patent_type = Some(ty.to_string());
            store.upsert_patent(&rec).unwrap();
        }
        let q = FlatQuery {
            patent_type: Some("invention,design".to_string()),
            ..Default::default()
        };
        let (_, total) = store
            .search_patents(&compile_flat(&q), SearchOrder::PubDateDesc, 1, 20, 120)
            .unwrap();
        assert_eq!(total, 2);
    }

    #[test]
    fn collab_fields_respects_sample_limit() {
        let (_dir, store) = open_store();
        for i in 0..10 {
            store
                .upsert_patent(&sample(&format!("CN{}A", i), "Widget", 2015))
                .unwrap();
        }
        let rows = store
            .collab_fields(&compile(None), EntityField::Inventors, 4)
            .unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows[0].1.as_deref().unwrap().contains("Zhang San"));
        let rows = store
            .collab_fields(&compile(None), EntityField::Applicants, 100)
            .unwrap();
        assert_eq!(rows.len(), 10);
    }

    #[test]
    fn compare_fetch_by_pub_nos() {
        let (_dir, store) = open_store();
        for i in 0..4 {
            store
                .upsert_patent(&sample(&format!("CN{}A", i), "Widget", 2015))
                .unwrap();
        }
        let got = store
            .get_patents_by_pub_nos(&["CN1A".to_string(), "CN3A".to_string(), "CN9A".to_string()])
            .unwrap();
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn stats_by_domain_and_year_range() {
        let (_dir, store) = open_store();
        for (i, (year, granted)) in [(2018, 1), (2018, 0), (2019, 1)].into_iter().enumerate() {
            let mut rec = sample(&format!("CN{}A", i), "Widget", year);
            rec.grant_flag = granted;
            store.upsert_patent(&rec).unwrap();
        }
        let counts = store
            .domain_applications(Some("A01B"), None, None)
            .unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].year, Some(2018));
        assert_eq!(counts[0].count, 2);

        let rates = store.domain_grant_rate(None, Some(2018), Some(2018)).unwrap();
        assert_eq!(rates.len(), 1);
        assert!((rates[0].grant_rate - 0.5).abs() < 1e-9);

        let none = store.domain_applications(Some("Z99"), None, None).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn org_membership_handles_mixed_delimiters() {
        let (_dir, store) = open_store();
        let mut rec = sample("CN1A", "Widget", 2018);
        rec.applicants_current = Some("Acme|Beta;Gamma".to_string());
        store.upsert_patent(&rec).unwrap();

        let hit = store.org_year_counts(Some("Beta"), None, None).unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].count, 1);
        let miss = store.org_year_counts(Some("Bet"), None, None).unwrap();
        assert!(miss.is_empty());
    }

    #[test]
    fn export_rows_ordered_and_capped() {
        let (_dir, store) = open_store();
        for i in 0..5 {
            store
                .upsert_patent(&sample(&format!("CN{}A", i), "Widget", 2010 + i))
                .unwrap();
        }
        let rows = store.export_rows(3).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].pub_no, "CN4A");
    }
}
