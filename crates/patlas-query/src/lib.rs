//! Patlas Query — filter predicate model and SQL compiler.
//!
//! Advanced search accepts a recursive boolean tree of field predicates.
//! The compiler walks the tree and emits a single WHERE expression over the
//! `patents` table plus uniquely named bound parameters. Malformed input
//! (unknown fields, unparseable numbers, empty subtrees) always degrades to
//! a permissive `1=1` clause instead of an error — advanced search must
//! never fail on weird client input. This is a deliberate policy, not a
//! missing validation layer.

pub mod compile;
pub mod predicate;
pub mod tree;

pub use compile::{compile, compile_flat, sanitize_match_query, FlatQuery};
pub use predicate::{CompiledPredicate, ParamValue};
pub use tree::{FilterNode, FilterRule, FilterTree};
