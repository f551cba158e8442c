//! Application state.

use std::sync::Arc;

use festa_store::RocksStore;

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        if config.station_api_key.is_none() {
            tracing::warn!("Station API key not configured - mutating routes are unauthenticated");
        }

        Self { store, config }
    }

    /// Check if station authentication is enforced.
    #[must_use]
    pub fn has_station_auth(&self) -> bool {
        self.config.station_api_key.is_some()
    }
}
