//! Patlas Store — SQLite-backed patent record store.
//!
//! One database file holds the patent corpus (with an FTS5 full-text
//! index over title and abstract) and the account tables: users,
//! sessions, reset tokens, favorites, notes, and export tasks.

pub mod accounts;
pub mod normalize;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use accounts::hash_password;
pub use sqlite::{EntityField, PatentStore};
pub use types::*;
