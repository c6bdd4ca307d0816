//! Field derivations applied when importing raw patent rows.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static IPC_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]\d{2}[A-Z]?").unwrap());

/// Patent type from the publication-number suffix letter.
pub fn derive_patent_type(pub_no: &str) -> Option<&'static str> {
    match pub_no.trim().to_uppercase().chars().last()? {
        'U' => Some("utility_model"),
        'S' => Some("design"),
        'A' | 'B' => Some("invention"),
        _ => None,
    }
}

/// IPC domain prefix from the main classification, e.g. `A01B 1/00` ->
/// `A01B`. Falls back to the first four characters when the pattern is
/// absent.
pub fn derive_ipc_prefix(ipc_main: &str) -> Option<String> {
    let compact: String = ipc_main
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if compact.is_empty() {
        return None;
    }
    match IPC_PREFIX_RE.find(&compact) {
        Some(m) => Some(m.as_str().to_string()),
        None => Some(compact.chars().take(4).collect()),
    }
}

/// Normalize an applicant list to comma separation: any run of the usual
/// delimiters becomes a single comma, with no leading/trailing commas.
pub fn normalize_applicants(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut pending_comma = false;
    for c in raw.chars() {
        let is_delim = matches!(c, '|' | ';' | '；' | '、' | ',' | '，') || c.is_whitespace();
        if is_delim {
            pending_comma = !out.is_empty();
        } else {
            if pending_comma {
                out.push(',');
                pending_comma = false;
            }
            out.push(c);
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Granted when the legal status carries a grant marker (the source
/// corpus uses the Chinese marker; an English one is accepted too).
pub fn derive_grant_flag(legal_status: &str) -> i64 {
    let lower = legal_status.to_lowercase();
    if legal_status.contains("授权") || lower.contains("grant") {
        1
    } else {
        0
    }
}

/// Parse a date written with `-`, `.`, or `/` separators into
/// `YYYY-MM-DD`. Unparseable input yields `None`.
pub fn parse_flexible_date(raw: &str) -> Option<String> {
    let normalized: String = raw
        .trim()
        .chars()
        .map(|c| if c == '.' || c == '/' { '-' } else { c })
        .collect();
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patent_type_from_suffix() {
        assert_eq!(derive_patent_type("CN207151137U"), Some("utility_model"));
        assert_eq!(derive_patent_type("CN305432109S"), Some("design"));
        assert_eq!(derive_patent_type("CN108243675A"), Some("invention"));
        assert_eq!(derive_patent_type("CN103004315B"), Some("invention"));
        assert_eq!(derive_patent_type("CN1234567"), None);
        assert_eq!(derive_patent_type(""), None);
    }

    #[test]
    fn ipc_prefix_extraction() {
        assert_eq!(derive_ipc_prefix("A01B 1/00").as_deref(), Some("A01B"));
        assert_eq!(derive_ipc_prefix("g06f 17/30").as_deref(), Some("G06F"));
        assert_eq!(derive_ipc_prefix("A01").as_deref(), Some("A01"));
        // No class pattern: first four characters.
        assert_eq!(derive_ipc_prefix("XYZW123").as_deref(), Some("XYZW"));
        assert_eq!(derive_ipc_prefix("  "), None);
    }

    #[test]
    fn applicant_normalization() {
        assert_eq!(
            normalize_applicants("Acme|Beta; Gamma、Delta").as_deref(),
            Some("Acme,Beta,Gamma,Delta")
        );
        assert_eq!(normalize_applicants(";;Acme;;").as_deref(), Some("Acme"));
        assert_eq!(normalize_applicants(" ; "), None);
    }

    #[test]
    fn grant_flag_markers() {
        assert_eq!(derive_grant_flag("授权"), 1);
        assert_eq!(derive_grant_flag("Granted 2020"), 1);
        assert_eq!(derive_grant_flag("实质审查"), 0);
        assert_eq!(derive_grant_flag(""), 0);
    }

    #[test]
    fn flexible_date_parsing() {
        assert_eq!(parse_flexible_date("2020-03-05").as_deref(), Some("2020-03-05"));
        assert_eq!(parse_flexible_date("2020.3.5").as_deref(), Some("2020-03-05"));
        assert_eq!(parse_flexible_date("2020/03/05").as_deref(), Some("2020-03-05"));
        assert_eq!(parse_flexible_date("not a date"), None);
        assert_eq!(parse_flexible_date(""), None);
    }
}
