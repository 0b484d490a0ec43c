//! Draft store state.

use std::sync::Arc;
use vitrina_sync::DraftStore;

/// Wrapper around the shared [`DraftStore`].
#[derive(Clone)]
pub struct CatalogState {
    store: Arc<DraftStore>,
}

impl CatalogState {
    pub fn new(store: Arc<DraftStore>) -> Self {
        CatalogState { store }
    }

    /// Returns the inner store.
    pub fn store(&self) -> &Arc<DraftStore> {
        &self.store
    }
}
