//! Shared application state.

use patlas_core::PatlasConfig;
use patlas_store::PatentStore;

/// Shared application state accessible from all route handlers. The store
/// is the only stateful collaborator; per-request aggregation state lives
/// and dies inside the handlers.
pub struct AppState {
    pub config: PatlasConfig,
    pub store: PatentStore,
}

impl AppState {
    pub fn new(config: PatlasConfig, store: PatentStore) -> Self {
        Self { config, store }
    }
}
