//! Patlas Graph — relationship views over patent records.
//!
//! Patent rows embed multi-valued fields (applicant and inventor lists) as
//! delimited text blobs. This crate extracts those lists, aggregates
//! co-occurrence across a bulk sample into a pruned weighted graph, and
//! builds small per-record ego graphs and two-hop bridge paths. All state
//! is request-local; nothing here touches storage.

pub mod collab;
pub mod ego;
pub mod split;
pub mod types;

pub use collab::{aggregate, CollabLimits, EntityList};
pub use ego::{bridge_path, neighbor_graph, PatentLink};
pub use split::{clean_name, split_list, split_names};
pub use types::{GraphEdge, GraphNode, GraphPayload, NodeKind, Relation};
