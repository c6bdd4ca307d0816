//! The filter-tree request model.

use serde::Deserialize;

/// A single field predicate from the client.
///
/// Every field is optional: a rule missing its field (or carrying a value
/// of the wrong shape) compiles to an always-true clause.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterRule {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub op: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// One entry in a tree's rule list: either a nested subtree or a leaf rule.
///
/// An object with a `rules` array is a subtree; anything else is treated as
/// a leaf rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FilterNode {
    Branch(FilterTree),
    Leaf(FilterRule),
}

/// A recursive boolean expression tree.
///
/// `logic` is case-normalized; any value other than `OR` means `AND`.
/// A tree with an empty rule list compiles to match-everything.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterTree {
    #[serde(default)]
    pub logic: Option<String>,
    pub rules: Vec<FilterNode>,
}

impl FilterTree {
    /// Lenient parse from arbitrary request JSON. Anything that does not
    /// look like a filter tree yields `None`, which the compiler treats as
    /// match-everything.
    pub fn from_json(value: &serde_json::Value) -> Option<FilterTree> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Whether the tree combines its children with OR (default is AND).
    pub fn is_or(&self) -> bool {
        self.logic
            .as_deref()
            .map(|l| l.trim().eq_ignore_ascii_case("OR"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_and_branch_disambiguate() {
        let v = serde_json::json!({
            "logic": "AND",
            "rules": [
                {"field": "kw", "op": "like", "value": "drone"},
                {"logic": "or", "rules": [{"field": "apply_year", "op": ">=", "value": 2015}]},
            ]
        });
        let tree = FilterTree::from_json(&v).unwrap();
        assert_eq!(tree.rules.len(), 2);
        assert!(matches!(tree.rules[0], FilterNode::Leaf(_)));
        assert!(matches!(tree.rules[1], FilterNode::Branch(_)));
    }

    #[test]
    fn garbage_tree_parses_to_none() {
        assert!(FilterTree::from_json(&serde_json::json!("not a tree")).is_none());
        assert!(FilterTree::from_json(&serde_json::json!({"logic": "AND"})).is_none());
    }

    #[test]
    fn non_array_rules_member_becomes_leaf() {
        // {"rules": "x"} is not a subtree; it falls back to an opaque leaf.
        let v = serde_json::json!({"rules": [{"rules": "x"}]});
        let tree = FilterTree::from_json(&v).unwrap();
        assert!(matches!(tree.rules[0], FilterNode::Leaf(_)));
    }

    #[test]
    fn or_logic_is_case_insensitive() {
        let v = serde_json::json!({"logic": "or", "rules": []});
        assert!(FilterTree::from_json(&v).unwrap().is_or());
        let v = serde_json::json!({"logic": "XOR", "rules": []});
        assert!(!FilterTree::from_json(&v).unwrap().is_or());
    }
}
