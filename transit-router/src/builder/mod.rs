//! Network builder.
//!
//! Stitches timetable feeds onto a street graph. For each feed, in feed-id
//! order: stops are snapped to the streets, trips become trip nodes with
//! board, ride, dwell and alight edges, stations get access and egress
//! edges, recommended transfers are resolved by walking, and transfer edges
//! are added. The spatial index is rebuilt over the complete graph last.

mod config;
mod error;
mod pipeline;
mod snap;
mod transfers;
mod trips;

use std::collections::BTreeMap;

use crate::domain::FeedId;
use crate::feed::Feed;
use crate::graph::Graph;
use crate::network::Network;

pub use config::{BuildConfig, InputErrorPolicy};
pub use error::BuildError;
pub use pipeline::{IndexStage, Pipeline, StreetStage, TransitOutput, TransitStage};
pub use snap::Snapper;
pub use trips::{Call, materialize_trip};

/// Builds a [`Network`] from feeds according to a [`BuildConfig`].
pub struct NetworkBuilder {
    pipeline: Pipeline,
}

impl NetworkBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            pipeline: Pipeline::from_config(&config),
        }
    }

    /// Use an already built street graph instead of the configured file.
    pub fn with_street_graph(mut self, graph: Graph) -> Self {
        self.pipeline.street = StreetStage::Graph(graph);
        self
    }

    /// Run the whole build. Any error aborts it and no network is returned.
    pub async fn build(self, feeds: BTreeMap<FeedId, Feed>) -> Result<Network, BuildError> {
        self.pipeline.run(feeds).await
    }
}
