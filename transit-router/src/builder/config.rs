//! Network build configuration.

use std::path::PathBuf;

use crate::router::RouterConfig;

/// Default distance within which a stop snaps to the street network.
const DEFAULT_SNAP_RADIUS_M: f64 = 300.0;

/// Default number of transfers resolved per blocking task.
const DEFAULT_RESOLVE_BATCH_SIZE: usize = 64;

/// What to do with a feed that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputErrorPolicy {
    /// Fail the whole build.
    #[default]
    Abort,
    /// Leave the feed out and carry on with a warning.
    SkipFeed,
}

/// Configuration parameters for building a network.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Street network file. Without one the street graph is empty and every
    /// station is disconnected from walking.
    pub street_file: Option<PathBuf>,

    /// Maximum distance between a stop and the street it snaps to (metres).
    pub snap_radius_m: f64,

    /// Cost of access and egress edges (seconds).
    pub access_penalty_secs: i64,

    /// Link stations of one feed that snap to the same street node.
    pub connect_same_node_stops: bool,

    /// Transfers resolved per blocking task.
    pub resolve_batch_size: usize,

    pub input_errors: InputErrorPolicy,

    /// Cost model used when resolving transfer durations.
    pub router: RouterConfig,

    /// Build an R-tree over the finished graph for snapping queries.
    pub spatial_index: bool,
}

impl BuildConfig {
    pub fn new() -> Self {
        Self {
            street_file: None,
            snap_radius_m: DEFAULT_SNAP_RADIUS_M,
            access_penalty_secs: 0,
            connect_same_node_stops: false,
            resolve_batch_size: DEFAULT_RESOLVE_BATCH_SIZE,
            input_errors: InputErrorPolicy::Abort,
            router: RouterConfig::default(),
            spatial_index: true,
        }
    }

    pub fn with_street_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.street_file = Some(path.into());
        self
    }

    pub fn with_snap_radius(mut self, metres: f64) -> Self {
        self.snap_radius_m = metres;
        self
    }

    pub fn with_access_penalty(mut self, secs: i64) -> Self {
        self.access_penalty_secs = secs;
        self
    }

    pub fn connect_same_node_stops(mut self, enabled: bool) -> Self {
        self.connect_same_node_stops = enabled;
        self
    }

    /// Set the batch size; zero is treated as one.
    pub fn with_resolve_batch_size(mut self, size: usize) -> Self {
        self.resolve_batch_size = size.max(1);
        self
    }

    pub fn with_input_errors(mut self, policy: InputErrorPolicy) -> Self {
        self.input_errors = policy;
        self
    }

    pub fn with_router(mut self, router: RouterConfig) -> Self {
        self.router = router;
        self
    }

    pub fn with_spatial_index(mut self, enabled: bool) -> Self {
        self.spatial_index = enabled;
        self
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::new()
    }
}
