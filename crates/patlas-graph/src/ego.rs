//! Single-record ego graph and two-record bridge path.

use std::collections::HashSet;

use crate::split::split_list;
use crate::types::{GraphEdge, GraphNode, GraphPayload, NodeKind, Relation};

/// Associated entities shown per relation in the ego graph.
const NEIGHBOR_FAN: usize = 5;
/// Organization entries scanned per side when looking for a bridge.
const BRIDGE_SCAN_LIMIT: usize = 20;

/// The link-relevant fields of one patent record.
#[derive(Debug, Clone, Default)]
pub struct PatentLink {
    pub pub_no: String,
    pub title: Option<String>,
    pub applicants: Option<String>,
    pub inventors: Option<String>,
    pub ipc_main_prefix: Option<String>,
}

impl PatentLink {
    fn label(&self) -> String {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.pub_no)
            .to_string()
    }
}

/// Build the one-hop neighborhood of a record: the patent in the center,
/// its applicants, inventors, and IPC domain around it.
///
/// `limit` caps the node count; edges are re-filtered afterwards so
/// truncation never leaves a dangling endpoint.
pub fn neighbor_graph(patent: &PatentLink, limit: usize) -> GraphPayload {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    let center_id = NodeKind::Patent.node_id(&patent.pub_no);
    nodes.push(GraphNode::plain(
        NodeKind::Patent,
        &patent.pub_no,
        patent.label(),
    ));

    for org in split_list(patent.applicants.as_deref(), NEIGHBOR_FAN) {
        nodes.push(GraphNode::plain(NodeKind::Organization, &org, org.clone()));
        edges.push(GraphEdge {
            source: center_id.clone(),
            target: NodeKind::Organization.node_id(&org),
            rel: Relation::AppliedBy,
            weight: None,
        });
    }

    for person in split_list(patent.inventors.as_deref(), NEIGHBOR_FAN) {
        nodes.push(GraphNode::plain(NodeKind::Inventor, &person, person.clone()));
        edges.push(GraphEdge {
            source: center_id.clone(),
            target: NodeKind::Inventor.node_id(&person),
            rel: Relation::InventedBy,
            weight: None,
        });
    }

    if let Some(prefix) = patent
        .ipc_main_prefix
        .as_deref()
        .filter(|p| !p.is_empty())
    {
        nodes.push(GraphNode::plain(NodeKind::Domain, prefix, prefix));
        edges.push(GraphEdge {
            source: center_id.clone(),
            target: NodeKind::Domain.node_id(prefix),
            rel: Relation::BelongsTo,
            weight: None,
        });
    }

    if nodes.len() > limit {
        nodes.truncate(limit);
    }
    let surviving: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    edges.retain(|e| surviving.contains(e.source.as_str()) && surviving.contains(e.target.as_str()));

    GraphPayload { nodes, edges }
}

/// Look for one intermediate node connecting two records: a shared
/// applicant organization first (first common entry by `a`'s scan order),
/// then a shared IPC domain. Returns `None` when the records share
/// neither — a heuristic depth-2 connector, not a path search.
pub fn bridge_path(a: &PatentLink, b: &PatentLink) -> Option<GraphPayload> {
    let a_orgs = split_list(a.applicants.as_deref(), BRIDGE_SCAN_LIMIT);
    let b_orgs: HashSet<String> = split_list(b.applicants.as_deref(), BRIDGE_SCAN_LIMIT)
        .into_iter()
        .collect();
    let shared_org = a_orgs.iter().find(|org| b_orgs.contains(*org));

    let a_id = NodeKind::Patent.node_id(&a.pub_no);
    let b_id = NodeKind::Patent.node_id(&b.pub_no);
    let mut path = GraphPayload::default();
    path.nodes
        .push(GraphNode::plain(NodeKind::Patent, &a.pub_no, a.label()));
    path.nodes
        .push(GraphNode::plain(NodeKind::Patent, &b.pub_no, b.label()));

    if let Some(org) = shared_org {
        let mid = NodeKind::Organization.node_id(org);
        path.nodes
            .push(GraphNode::plain(NodeKind::Organization, org, org.clone()));
        path.edges.push(GraphEdge {
            source: a_id,
            target: mid.clone(),
            rel: Relation::AppliedBy,
            weight: None,
        });
        path.edges.push(GraphEdge {
            source: mid,
            target: b_id,
            rel: Relation::AppliedBy,
            weight: None,
        });
        return Some(path);
    }

    let shared_domain = match (a.ipc_main_prefix.as_deref(), b.ipc_main_prefix.as_deref()) {
        (Some(x), Some(y)) if !x.is_empty() && x == y => Some(x),
        _ => None,
    };
    if let Some(prefix) = shared_domain {
        let mid = NodeKind::Domain.node_id(prefix);
        path.nodes
            .push(GraphNode::plain(NodeKind::Domain, prefix, prefix));
        path.edges.push(GraphEdge {
            source: a_id,
            target: mid.clone(),
            rel: Relation::BelongsTo,
            weight: None,
        });
        path.edges.push(GraphEdge {
            source: mid,
            target: b_id,
            rel: Relation::BelongsTo,
            weight: None,
        });
        return Some(path);
    }

    None
}
