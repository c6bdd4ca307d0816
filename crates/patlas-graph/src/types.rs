//! Shared graph node/edge model.

use serde::Serialize;

/// What a graph node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Patent,
    Organization,
    Inventor,
    Domain,
}

impl NodeKind {
    /// Stable composite id used for deduplication and joining.
    pub fn node_id(&self, key: &str) -> String {
        let prefix = match self {
            NodeKind::Patent => "patent",
            NodeKind::Organization => "org",
            NodeKind::Inventor => "inv",
            NodeKind::Domain => "ipc",
        };
        format!("{}:{}", prefix, key)
    }
}

/// Edge relation labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relation {
    AppliedBy,
    InventedBy,
    BelongsTo,
    CollabWith,
    CoinventWith,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Number of sampled records the entity participates in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    /// Up to a handful of sample publication numbers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pubs: Option<Vec<String>>,
}

impl GraphNode {
    /// A bare node without aggregation counters.
    pub fn plain(kind: NodeKind, key: &str, label: impl Into<String>) -> Self {
        Self {
            id: kind.node_id(key),
            label: label.into(),
            kind,
            count: None,
            pubs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub rel: Relation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

/// Final graph output, created fresh per request and discarded after the
/// response. Doubles as the path object for bridge paths.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphPayload {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_kind_prefixed() {
        assert_eq!(NodeKind::Patent.node_id("CN1A"), "patent:CN1A");
        assert_eq!(NodeKind::Organization.node_id("Acme"), "org:Acme");
        assert_eq!(NodeKind::Inventor.node_id("Zhang"), "inv:Zhang");
        assert_eq!(NodeKind::Domain.node_id("A01"), "ipc:A01");
    }

    #[test]
    fn relations_serialize_screaming_snake() {
        let e = GraphEdge {
            source: "a".into(),
            target: "b".into(),
            rel: Relation::CoinventWith,
            weight: Some(2),
        };
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["rel"], "COINVENT_WITH");
    }

    #[test]
    fn plain_node_omits_counters() {
        let n = GraphNode::plain(NodeKind::Domain, "A01", "A01");
        let v = serde_json::to_value(&n).unwrap();
        assert_eq!(v["type"], "domain");
        assert!(v.get("count").is_none());
        assert!(v.get("pubs").is_none());
    }
}
