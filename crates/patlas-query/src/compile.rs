//! Filter compilation — tree walk, per-field clause builders, flat filter.

use serde::Deserialize;

use crate::predicate::{CompiledPredicate, ParamBinder, ParamValue, MATCH_ALL};
use crate::tree::{FilterNode, FilterRule, FilterTree};

/// Compile a filter tree into a single WHERE expression.
///
/// `None` (absent tree) yields the match-everything predicate. No input
/// ever makes this fail: unknown fields, bad operators, and unparseable
/// values all compile to `1=1`.
pub fn compile(tree: Option<&FilterTree>) -> CompiledPredicate {
    let mut binder = ParamBinder::new();
    let sql = match tree {
        Some(t) => where_from_tree(t, &mut binder),
        None => MATCH_ALL.to_string(),
    };
    CompiledPredicate::new(sql, binder.into_params())
}

fn where_from_tree(tree: &FilterTree, binder: &mut ParamBinder) -> String {
    if tree.rules.is_empty() {
        return MATCH_ALL.to_string();
    }
    let logic = if tree.is_or() { "OR" } else { "AND" };
    let parts: Vec<String> = tree
        .rules
        .iter()
        .map(|node| match node {
            FilterNode::Branch(subtree) => format!("({})", where_from_tree(subtree, binder)),
            FilterNode::Leaf(rule) => clause_for_rule(rule, binder),
        })
        .collect();
    parts.join(&format!(" {} ", logic))
}

fn clause_for_rule(rule: &FilterRule, binder: &mut ParamBinder) -> String {
    // The counter advances once per rule regardless of outcome.
    let key = binder.next_key();
    match rule.field.as_deref() {
        Some("kw") => match text_value(rule.value.as_ref()) {
            Some(value) => keyword_clause(&key, value, binder),
            None => MATCH_ALL.to_string(),
        },
        Some("apply_year") => {
            let n = match numeric_value(rule.value.as_ref()) {
                Some(n) => n,
                None => return MATCH_ALL.to_string(),
            };
            let cmp = match rule.op.as_deref() {
                Some(">=") => ">=",
                Some("<=") => "<=",
                Some("=") => "=",
                _ => return MATCH_ALL.to_string(),
            };
            binder.push(key.clone(), year_param(n));
            format!("apply_year {} {}", cmp, key)
        }
        Some("ipc_prefix") => match text_value(rule.value.as_ref()) {
            Some(value) => {
                binder.push(key.clone(), ParamValue::Text(value));
                format!("ipc_main_prefix LIKE {} || '%'", key)
            }
            None => MATCH_ALL.to_string(),
        },
        Some("patent_type") => match text_value(rule.value.as_ref()) {
            Some(value) => {
                binder.push(key.clone(), ParamValue::Text(value));
                format!("patent_type = {}", key)
            }
            None => MATCH_ALL.to_string(),
        },
        Some("applicant") => match text_value(rule.value.as_ref()) {
            Some(value) => {
                binder.push(key.clone(), ParamValue::Text(value));
                format!("applicants_current LIKE '%' || {} || '%'", key)
            }
            None => MATCH_ALL.to_string(),
        },
        _ => MATCH_ALL.to_string(),
    }
}

/// Keyword search combines FTS5 relevance matching with plain substring
/// LIKE on title and abstract. Two parameters are bound from the same
/// input because the two arms escape differently: the MATCH form is
/// token-sanitized, the LIKE form is the raw substring.
fn keyword_clause(key: &str, value: String, binder: &mut ParamBinder) -> String {
    let like_key = format!("{}_like", key);
    let match_query = sanitize_match_query(&value);
    binder.push(like_key.clone(), ParamValue::Text(value));
    if match_query.is_empty() {
        return format!(
            "(title LIKE '%' || {lk} || '%' OR abstract LIKE '%' || {lk} || '%')",
            lk = like_key
        );
    }
    binder.push(key.to_string(), ParamValue::Text(match_query));
    format!(
        "(id IN (SELECT rowid FROM patents_fts WHERE patents_fts MATCH {k}) \
         OR title LIKE '%' || {lk} || '%' OR abstract LIKE '%' || {lk} || '%')",
        k = key,
        lk = like_key
    )
}

/// Sanitize a user keyword for FTS5 MATCH syntax: each token is stripped
/// of quotes, quote-wrapped, and the tokens are OR-joined. Returns an
/// empty string when no usable token remains.
pub fn sanitize_match_query(query: &str) -> String {
    let tokens: Vec<String> = query
        .split_whitespace()
        .map(|t| t.replace('"', ""))
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"", t))
        .collect();
    tokens.join(" OR ")
}

fn text_value(value: Option<&serde_json::Value>) -> Option<String> {
    let s = match value? {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let s = s.trim().to_string();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn numeric_value(value: Option<&serde_json::Value>) -> Option<f64> {
    let n = match value? {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if n.is_finite() {
        Some(n)
    } else {
        None
    }
}

fn year_param(n: f64) -> ParamValue {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        ParamValue::Int(n as i64)
    } else {
        ParamValue::Real(n)
    }
}

/// The flat (non-tree) filter carried by `GET /search` and the
/// collaboration-graph endpoints. Unknown query keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlatQuery {
    #[serde(default)]
    pub kw: Option<String>,
    #[serde(default, rename = "yearStart")]
    pub year_start: Option<String>,
    #[serde(default, rename = "yearEnd")]
    pub year_end: Option<String>,
    #[serde(default, rename = "type")]
    pub patent_type: Option<String>,
    #[serde(default, rename = "ipcPrefix")]
    pub ipc_prefix: Option<String>,
    #[serde(default)]
    pub applicant: Option<String>,
}

/// Compile the flat filter. Clauses are AND-joined; absent or unusable
/// values contribute nothing.
pub fn compile_flat(query: &FlatQuery) -> CompiledPredicate {
    let mut binder = ParamBinder::new();
    let mut clauses: Vec<String> = Vec::new();

    if let Some(kw) = nonempty(query.kw.as_deref()) {
        let key = binder.next_key();
        clauses.push(keyword_clause(&key, kw.to_string(), &mut binder));
    }
    if let Some(n) = year_from(query.year_start.as_deref()) {
        let key = binder.next_key();
        binder.push(key.clone(), year_param(n));
        clauses.push(format!("apply_year >= {}", key));
    }
    if let Some(n) = year_from(query.year_end.as_deref()) {
        let key = binder.next_key();
        binder.push(key.clone(), year_param(n));
        clauses.push(format!("apply_year <= {}", key));
    }
    if let Some(types) = nonempty(query.patent_type.as_deref()) {
        // Comma-separated membership list.
        let key = binder.next_key();
        binder.push(key.clone(), ParamValue::Text(types.to_string()));
        clauses.push(format!(
            "instr(',' || {k} || ',', ',' || patent_type || ',') > 0",
            k = key
        ));
    }
    if let Some(prefix) = nonempty(query.ipc_prefix.as_deref()) {
        let key = binder.next_key();
        binder.push(key.clone(), ParamValue::Text(prefix.to_string()));
        clauses.push(format!("ipc_main_prefix LIKE {} || '%'", key));
    }
    if let Some(applicant) = nonempty(query.applicant.as_deref()) {
        let key = binder.next_key();
        binder.push(key.clone(), ParamValue::Text(applicant.to_string()));
        clauses.push(format!("applicants_current LIKE '%' || {} || '%'", key));
    }

    let sql = if clauses.is_empty() {
        MATCH_ALL.to_string()
    } else {
        clauses.join(" AND ")
    };
    CompiledPredicate::new(sql, binder.into_params())
}

fn nonempty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn year_from(value: Option<&str>) -> Option<f64> {
    nonempty(value)?.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(v: serde_json::Value) -> FilterTree {
        FilterTree::from_json(&v).unwrap()
    }

    #[test]
    fn absent_tree_matches_all() {
        let pred = compile(None);
        assert_eq!(pred.sql(), "1=1");
        assert!(pred.params().is_empty());
    }

    #[test]
    fn empty_rules_match_all() {
        let t = tree(serde_json::json!({"logic": "OR", "rules": []}));
        assert_eq!(compile(Some(&t)).sql(), "1=1");
    }

    #[test]
    fn nested_empty_subtree_is_permissive() {
        let t = tree(serde_json::json!({
            "rules": [
                {"field": "apply_year", "op": ">=", "value": 2015},
                {"logic": "AND", "rules": []},
            ]
        }));
        let pred = compile(Some(&t));
        assert_eq!(pred.sql(), "apply_year >= :p1 AND (1=1)");
    }

    #[test]
    fn keyword_binds_match_and_like_forms() {
        let t = tree(serde_json::json!({"rules": [{"field": "kw", "value": "soil sensor"}]}));
        let pred = compile(Some(&t));
        assert!(pred.sql().contains("patents_fts MATCH :p1"));
        assert!(pred.sql().contains(":p1_like"));
        let names: Vec<&str> = pred.params().iter().map(|(n, _)| n.as_str()).collect();
        assert!(names.contains(&":p1"));
        assert!(names.contains(&":p1_like"));
        // MATCH form is sanitized, LIKE form is the raw substring.
        assert!(pred
            .params()
            .iter()
            .any(|(n, v)| n == ":p1" && *v == ParamValue::Text("\"soil\" OR \"sensor\"".into())));
        assert!(pred
            .params()
            .iter()
            .any(|(n, v)| n == ":p1_like" && *v == ParamValue::Text("soil sensor".into())));
    }

    #[test]
    fn keyword_of_only_quotes_keeps_like_arm_only() {
        let t = tree(serde_json::json!({"rules": [{"field": "kw", "value": "\"\""}]}));
        let pred = compile(Some(&t));
        assert!(!pred.sql().contains("MATCH"));
        assert!(pred.sql().contains(":p1_like"));
    }

    #[test]
    fn year_operators() {
        for op in [">=", "<=", "="] {
            let t = tree(serde_json::json!({
                "rules": [{"field": "apply_year", "op": op, "value": "2018"}]
            }));
            let pred = compile(Some(&t));
            assert_eq!(pred.sql(), format!("apply_year {} :p1", op));
            assert_eq!(pred.params()[0].1, ParamValue::Int(2018));
        }
    }

    #[test]
    fn non_numeric_year_degrades_to_match_all() {
        let t = tree(serde_json::json!({
            "rules": [{"field": "apply_year", "op": ">=", "value": "abc"}]
        }));
        let pred = compile(Some(&t));
        assert_eq!(pred.sql(), "1=1");
        assert!(pred.params().is_empty());
    }

    #[test]
    fn unsupported_year_operator_degrades() {
        let t = tree(serde_json::json!({
            "rules": [{"field": "apply_year", "op": "!=", "value": 2018}]
        }));
        assert_eq!(compile(Some(&t)).sql(), "1=1");
    }

    #[test]
    fn unknown_field_degrades() {
        let t = tree(serde_json::json!({"rules": [{"field": "shoe_size", "value": 42}]}));
        assert_eq!(compile(Some(&t)).sql(), "1=1");
    }

    #[test]
    fn empty_value_degrades() {
        let t = tree(serde_json::json!({"rules": [{"field": "applicant", "value": "  "}]}));
        assert_eq!(compile(Some(&t)).sql(), "1=1");
    }

    #[test]
    fn unknown_logic_joins_with_and() {
        let t = tree(serde_json::json!({
            "logic": "NAND",
            "rules": [
                {"field": "ipc_prefix", "value": "A01"},
                {"field": "patent_type", "value": "invention"},
            ]
        }));
        let pred = compile(Some(&t));
        assert_eq!(
            pred.sql(),
            "ipc_main_prefix LIKE :p1 || '%' AND patent_type = :p2"
        );
    }

    #[test]
    fn or_logic_joins_with_or() {
        let t = tree(serde_json::json!({
            "logic": "or",
            "rules": [
                {"field": "ipc_prefix", "value": "A01"},
                {"field": "ipc_prefix", "value": "G06"},
            ]
        }));
        assert!(compile(Some(&t)).sql().contains(" OR "));
    }

    #[test]
    fn parameter_names_unique_across_nesting() {
        let t = tree(serde_json::json!({
            "rules": [
                {"field": "kw", "value": "wheat"},
                {"logic": "OR", "rules": [
                    {"field": "applicant", "value": "Acme"},
                    {"field": "apply_year", "op": "=", "value": 2020},
                ]},
                {"field": "patent_type", "value": "invention"},
            ]
        }));
        let pred = compile(Some(&t));
        let mut names: Vec<&str> = pred.params().iter().map(|(n, _)| n.as_str()).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total, "parameter names must be unique");
        assert!(pred.sql().starts_with('('));
        assert!(pred.sql().contains("(applicants_current LIKE '%' || :p2 || '%' OR apply_year = :p3)"));
    }

    #[test]
    fn sanitize_match_query_strips_quotes_and_joins() {
        assert_eq!(sanitize_match_query("a b"), "\"a\" OR \"b\"");
        assert_eq!(sanitize_match_query("say \"hi\""), "\"say\" OR \"hi\"");
        assert_eq!(sanitize_match_query("  \" \"  "), "");
        assert_eq!(sanitize_match_query(""), "");
    }

    #[test]
    fn flat_query_all_fields() {
        let q = FlatQuery {
            kw: Some("drone".into()),
            year_start: Some("2010".into()),
            year_end: Some("2020".into()),
            patent_type: Some("invention,design".into()),
            ipc_prefix: Some("A01".into()),
            applicant: Some("Acme".into()),
        };
        let pred = compile_flat(&q);
        assert!(pred.sql().contains("apply_year >="));
        assert!(pred.sql().contains("apply_year <="));
        assert!(pred.sql().contains("instr("));
        assert!(pred.sql().contains("ipc_main_prefix LIKE"));
        assert!(pred.sql().contains("applicants_current LIKE"));
        assert_eq!(pred.sql().matches(" AND ").count(), 5);
    }

    #[test]
    fn flat_query_empty_matches_all() {
        let pred = compile_flat(&FlatQuery::default());
        assert_eq!(pred.sql(), "1=1");
        assert!(pred.params().is_empty());
    }

    #[test]
    fn flat_query_bad_year_is_skipped() {
        let q = FlatQuery {
            year_start: Some("abc".into()),
            ..Default::default()
        };
        assert_eq!(compile_flat(&q).sql(), "1=1");
    }
}
