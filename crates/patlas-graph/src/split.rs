//! Delimited entity-list extraction.
//!
//! Applicant and inventor fields arrive as one text blob per record, with
//! entries separated by an inconsistent mix of ASCII and full-width
//! punctuation and whitespace. The extractor splits on any run of those
//! delimiters, bounds the list length (the cap limits the quadratic
//! pairing cost downstream), and deduplicates exact matches.

use std::collections::HashSet;

fn is_delimiter(c: char) -> bool {
    matches!(c, ',' | ';' | '|' | '，' | '；' | '、') || c.is_whitespace()
}

/// Split a raw delimited field into a deduplicated, length-bounded list.
/// `limit` of 0 means unbounded. Order follows first occurrence.
pub fn split_list(raw: Option<&str>, limit: usize) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let mut pieces: Vec<&str> = raw
        .split(is_delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if limit > 0 && pieces.len() > limit {
        pieces.truncate(limit);
    }
    dedup(pieces.into_iter().map(str::to_string))
}

/// Split an inventor field, additionally applying the person-name
/// cleaning pass. Entries rejected by cleaning are dropped, so the result
/// may be shorter than `limit`.
pub fn split_names(raw: Option<&str>, limit: usize) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let mut pieces: Vec<&str> = raw
        .split(is_delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if limit > 0 && pieces.len() > limit {
        pieces.truncate(limit);
    }
    dedup(pieces.into_iter().filter_map(clean_name))
}

/// Name-cleaning rules for person names: pipes are stripped, residual
/// list punctuation collapses to single spaces, and entries that are too
/// short or consist only of dots/underscores/hyphens are rejected.
pub fn clean_name(name: &str) -> Option<String> {
    let mapped: String = name
        .chars()
        .filter(|c| *c != '|')
        .map(|c| match c {
            '，' | '；' | ';' | '、' => ' ',
            c if c.is_whitespace() => ' ',
            c => c,
        })
        .collect();
    let cleaned = mapped.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() <= 1 {
        return None;
    }
    if cleaned.chars().all(|c| matches!(c, '.' | '_' | '-')) {
        return None;
    }
    Some(cleaned)
}

fn dedup(entries: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for entry in entries {
        if seen.insert(entry.clone()) {
            out.push(entry);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_mixed_delimiters() {
        let got = split_list(Some("Acme Corp;Beta|Gamma，Delta、Eps"), 0);
        // "Acme Corp" splits on the space too: the delimiter set includes
        // whitespace, matching the source data's habits.
        assert_eq!(got, vec!["Acme", "Corp", "Beta", "Gamma", "Delta", "Eps"]);
    }

    #[test]
    fn runs_of_delimiters_collapse() {
        assert_eq!(split_list(Some("a,, ;; b"), 0), vec!["a", "b"]);
        // Delimiter ordering within a run does not change membership.
        assert_eq!(split_list(Some("a ;,,; b"), 0), vec!["a", "b"]);
    }

    #[test]
    fn empty_and_missing_input() {
        assert!(split_list(None, 10).is_empty());
        assert!(split_list(Some(""), 10).is_empty());
        assert!(split_list(Some(" ;,、 "), 10).is_empty());
    }

    #[test]
    fn truncates_before_dedup() {
        // The limit bounds raw pieces; duplicates inside the window
        // collapse afterwards.
        assert_eq!(split_list(Some("A,A,B"), 2), vec!["A"]);
        assert_eq!(split_list(Some("A,B,C,D"), 2), vec!["A", "B"]);
        assert_eq!(split_list(Some("A,B,C"), 0), vec!["A", "B", "C"]);
    }

    #[test]
    fn dedup_is_case_sensitive() {
        assert_eq!(split_list(Some("acme,Acme,acme"), 0), vec!["acme", "Acme"]);
    }

    #[test]
    fn extraction_is_idempotent() {
        let raw = Some("X,Y,,X;Z");
        assert_eq!(split_list(raw, 10), split_list(raw, 10));
    }

    #[test]
    fn clean_rejects_short_and_punctuation_names() {
        assert_eq!(clean_name("W"), None);
        assert_eq!(clean_name("..."), None);
        assert_eq!(clean_name("_-_"), None);
        assert_eq!(clean_name("  "), None);
        assert_eq!(clean_name("Li Ming"), Some("Li Ming".into()));
    }

    #[test]
    fn clean_collapses_residual_punctuation() {
        assert_eq!(clean_name("Zhang||San"), Some("ZhangSan".into()));
        assert_eq!(clean_name("Li；Hua"), Some("Li Hua".into()));
        assert_eq!(clean_name("  Wang    Wei "), Some("Wang Wei".into()));
    }

    #[test]
    fn split_names_drops_rejected_entries() {
        let got = split_names(Some("Zhang,W,...,Liu"), 10);
        assert_eq!(got, vec!["Zhang", "Liu"]);
    }
}
