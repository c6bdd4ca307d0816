//! Compiled predicate output: SQL text plus named bound parameters.

use rusqlite::types::ToSqlOutput;
use rusqlite::ToSql;

/// The always-true clause every malformed input degrades to.
pub(crate) const MATCH_ALL: &str = "1=1";

/// A value bound to a named SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Int(i64),
    Real(f64),
}

impl ToSql for ParamValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            ParamValue::Text(s) => s.to_sql(),
            ParamValue::Int(n) => n.to_sql(),
            ParamValue::Real(f) => f.to_sql(),
        }
    }
}

/// A compiled WHERE expression over the `patents` table.
///
/// Parameter names (`:p1`, `:p2`, ...) are unique within one compilation;
/// every name referenced by `sql` has exactly one bound value.
#[derive(Debug, Clone)]
pub struct CompiledPredicate {
    sql: String,
    params: Vec<(String, ParamValue)>,
}

impl CompiledPredicate {
    pub(crate) fn new(sql: String, params: Vec<(String, ParamValue)>) -> Self {
        Self { sql, params }
    }

    /// The predicate that matches every record.
    pub fn match_all() -> Self {
        Self {
            sql: MATCH_ALL.to_string(),
            params: Vec::new(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[(String, ParamValue)] {
        &self.params
    }

    /// Borrow the parameters in the form `rusqlite` binds from.
    pub fn bind_args(&self) -> Vec<(&str, &dyn ToSql)> {
        self.params
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect()
    }
}

/// Shared monotonic parameter counter threaded through the compiler.
///
/// One binder per compilation guarantees no name collision across sibling
/// or nested clauses.
#[derive(Debug, Default)]
pub(crate) struct ParamBinder {
    seq: u32,
    params: Vec<(String, ParamValue)>,
}

impl ParamBinder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Allocate the next parameter name. The counter advances for every
    /// rule visited, bound or not.
    pub(crate) fn next_key(&mut self) -> String {
        self.seq += 1;
        format!(":p{}", self.seq)
    }

    pub(crate) fn push(&mut self, name: String, value: ParamValue) {
        self.params.push((name, value));
    }

    pub(crate) fn into_params(self) -> Vec<(String, ParamValue)> {
        self.params
    }
}
