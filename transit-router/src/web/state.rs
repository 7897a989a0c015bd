//! Application state for the web layer.

use std::sync::Arc;

use crate::network::Network;
use crate::router::RouterConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The finished network, shared read-only by all queries
    pub network: Arc<Network>,

    /// Cost model for queries
    pub router: Arc<RouterConfig>,
}

impl AppState {
    pub fn new(network: Network, router: RouterConfig) -> Self {
        Self {
            network: Arc::new(network),
            router: Arc::new(router),
        }
    }
}
