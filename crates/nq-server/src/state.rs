use nq_core::SharedQueryStore;

/// Shared application state.
pub struct AppState {
    pub store: SharedQueryStore,
}

impl AppState {
    pub fn new(store: SharedQueryStore) -> Self {
        Self { store }
    }
}
