use std::sync::Arc;

use reelflow_store::JobStore;

use crate::config::ServerConfig;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub config: Arc<ServerConfig>,
}
