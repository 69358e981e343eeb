//! Application state for the settlement engine API.

use std::sync::Arc;

use crate::config::EngineSettings;
use crate::store::PayrollStore;

/// Shared application state.
///
/// Holds the injected store and engine settings; everything else the
/// handlers need is constructed per request from these two.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn PayrollStore>,
    settings: EngineSettings,
}

impl AppState {
    /// Creates application state over a store and settings.
    pub fn new(store: Arc<dyn PayrollStore>, settings: EngineSettings) -> Self {
        Self { store, settings }
    }

    /// The injected store.
    pub fn store(&self) -> Arc<dyn PayrollStore> {
        Arc::clone(&self.store)
    }

    /// The engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_app_state_is_clone() {
        // axum requires Clone state
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();

        let state = AppState::new(Arc::new(MemoryStore::new()), EngineSettings::default());
        let _ = state.clone().store();
    }
}
