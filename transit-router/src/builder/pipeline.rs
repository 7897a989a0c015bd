//! The staged network build: streets, then transit, then the index.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::{FeedId, NodeId, StopKey};
use crate::feed::{Feed, TransferKind};
use crate::graph::street::StreetNetwork;
use crate::graph::{EdgeKind, Graph, NodeKind, Timetable};
use crate::index::{self, EmptyIndex, LocationIndex, RTreeIndex};
use crate::network::{Network, ResolvedTransfer};

use super::config::{BuildConfig, InputErrorPolicy};
use super::error::BuildError;
use super::snap::Snapper;
use super::transfers::{self, PendingTransfer};
use super::trips::materialize_trip;

/// Station node and snapped street node of every stop in a feed.
type StationMap = BTreeMap<StopKey, (NodeId, Option<NodeId>)>;

/// Where the street graph comes from.
pub enum StreetStage {
    /// No street network: every station is disconnected from walking.
    Empty,
    /// Load a street file.
    File(PathBuf),
    /// Use a graph built elsewhere.
    Graph(Graph),
}

impl StreetStage {
    pub fn run(self) -> Result<Graph, BuildError> {
        match self {
            StreetStage::Empty => Ok(Graph::new()),
            StreetStage::File(path) => Ok(StreetNetwork::load(&path)?.into_graph()?),
            StreetStage::Graph(graph) => Ok(graph),
        }
    }
}

/// Adds feeds to the graph.
pub struct TransitStage {
    config: BuildConfig,
}

/// What the transit stage hands on to the index stage.
pub struct TransitOutput {
    pub graph: Graph,
    pub timetable: Timetable,
    pub transfers: Vec<ResolvedTransfer>,
}

impl TransitStage {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    /// Add every feed, in feed-id order.
    pub async fn run(
        &self,
        mut graph: Graph,
        feeds: BTreeMap<FeedId, Feed>,
    ) -> Result<TransitOutput, BuildError> {
        // Stations are not street nodes, so one street index serves all feeds.
        let street_index = RTreeIndex::streets(&graph);
        let mut timetable = Timetable::new();
        let mut resolved = Vec::new();

        for (feed_id, feed) in feeds {
            if let Err(source) = feed.validate() {
                match self.config.input_errors {
                    InputErrorPolicy::Abort => {
                        return Err(BuildError::Feed {
                            feed: feed_id,
                            source,
                        });
                    }
                    InputErrorPolicy::SkipFeed => {
                        warn!(feed = %feed_id, error = %source, "Skipping invalid feed");
                        continue;
                    }
                }
            }
            info!(
                feed = %feed_id,
                stops = feed.stops.len(),
                trips = feed.trips.len(),
                transfers = feed.transfers.len(),
                "Adding feed"
            );

            let stations = self.add_stations(&mut graph, &street_index, &feed_id, &feed);
            self.add_trips(&mut graph, &mut timetable, &feed_id, &feed, &stations)?;
            self.add_access(&mut graph, &stations);

            let (committed, snapshot) = self
                .resolve_transfers(graph, timetable, &feed_id, &feed, &stations)
                .await?;
            graph = snapshot.0;
            timetable = snapshot.1;

            let added = transfers::add_transfer_edges(&mut graph, &stations, &committed)?;
            debug!(feed = %feed_id, records = committed.len(), edges = added, "Added transfers");
            resolved.extend(committed);
        }

        Ok(TransitOutput {
            graph,
            timetable,
            transfers: resolved,
        })
    }

    fn add_stations(
        &self,
        graph: &mut Graph,
        street_index: &RTreeIndex,
        feed_id: &FeedId,
        feed: &Feed,
    ) -> StationMap {
        let mut snapped = Vec::with_capacity(feed.stops.len());
        {
            let snapper = Snapper::new(graph, street_index, self.config.snap_radius_m);
            for stop in feed.stops.values() {
                snapped.push((stop, snapper.snap(stop.coord)));
            }
        }

        let mut stations = StationMap::new();
        for (stop, street) in snapped {
            let key = StopKey::new(feed_id.clone(), stop.id.clone());
            if street.is_none() {
                warn!(
                    stop = %key,
                    radius_m = self.config.snap_radius_m,
                    "No street within snap radius; station is only reachable by transit"
                );
            }
            let node = graph.add_node(stop.coord, NodeKind::Station { stop: key.clone() });
            stations.insert(key, (node, street));
        }
        stations
    }

    fn add_trips(
        &self,
        graph: &mut Graph,
        timetable: &mut Timetable,
        feed_id: &FeedId,
        feed: &Feed,
        stations: &StationMap,
    ) -> Result<(), BuildError> {
        for trip in feed.trips.values() {
            // Validation guarantees every stop time names a known stop.
            let calls: Vec<_> = trip
                .stop_times()
                .iter()
                .filter_map(|st| {
                    let key = StopKey::new(feed_id.clone(), st.stop_id.clone());
                    stations
                        .get(&key)
                        .map(|(node, _)| (*node, st.arrival, st.departure))
                })
                .collect();
            materialize_trip(graph, timetable, feed_id, &trip.id, &calls)?;
        }
        Ok(())
    }

    fn add_access(&self, graph: &mut Graph, stations: &StationMap) {
        let secs = self.config.access_penalty_secs;
        for &(station, street) in stations.values() {
            if let Some(street) = street {
                graph.add_edge(street, station, EdgeKind::Access { secs });
                graph.add_edge(station, street, EdgeKind::Egress { secs });
            }
        }
    }

    /// Commit the feed's transfer records, resolving recommended ones.
    ///
    /// The graph and timetable are moved into a shared snapshot while the
    /// searches run and handed back afterwards.
    async fn resolve_transfers(
        &self,
        graph: Graph,
        timetable: Timetable,
        feed_id: &FeedId,
        feed: &Feed,
        stations: &StationMap,
    ) -> Result<(Vec<ResolvedTransfer>, (Graph, Timetable)), BuildError> {
        let node_of = |stop: &str| {
            let key = StopKey::new(feed_id.clone(), stop);
            match stations.get(&key) {
                Some((node, _)) => Ok((key, *node)),
                None => Err(BuildError::UnknownTransferStop {
                    feed: feed_id.clone(),
                    stop: stop.to_string(),
                }),
            }
        };

        let mut committed = Vec::with_capacity(feed.transfers.len());
        let mut pending = Vec::new();
        for transfer in &feed.transfers {
            let (from, from_node) = node_of(&transfer.from_stop)?;
            let (to, to_node) = node_of(&transfer.to_stop)?;
            if transfer.kind == TransferKind::Recommended {
                pending.push((
                    committed.len(),
                    PendingTransfer {
                        from: from.clone(),
                        to: to.clone(),
                        from_node,
                        to_node,
                    },
                ));
            }
            committed.push(ResolvedTransfer {
                from,
                to,
                kind: transfer.kind,
                secs: transfer.min_transfer_secs,
            });
        }

        let (graph, timetable) = if pending.is_empty() {
            (graph, timetable)
        } else {
            let graph = Arc::new(graph);
            let timetable = Arc::new(timetable);
            let (slots, jobs): (Vec<usize>, Vec<PendingTransfer>) = pending.into_iter().unzip();
            let durations = transfers::resolve(
                Arc::clone(&graph),
                Arc::clone(&timetable),
                self.config.router.walk_only(),
                jobs,
                self.config.resolve_batch_size,
            )
            .await?;
            for (slot, secs) in slots.into_iter().zip(durations) {
                committed[slot].kind = TransferKind::MinimumTime;
                committed[slot].secs = Some(secs);
            }
            (Arc::unwrap_or_clone(graph), Arc::unwrap_or_clone(timetable))
        };

        if self.config.connect_same_node_stops {
            let explicit: BTreeSet<(StopKey, StopKey)> = committed
                .iter()
                .map(|t| (t.from.clone(), t.to.clone()))
                .collect();
            committed.extend(transfers::same_node_transfers(stations, &explicit));
        }

        Ok((committed, (graph, timetable)))
    }
}

/// Builds the spatial index over the finished graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStage {
    /// R-tree over street and station nodes, or the empty index for a graph
    /// without nodes.
    Spatial,
    /// No index: coordinate snapping on the finished network always misses.
    None,
}

impl IndexStage {
    pub fn run(self, graph: &Graph) -> Arc<dyn LocationIndex> {
        match self {
            IndexStage::Spatial => index::complete(graph),
            IndexStage::None => Arc::new(EmptyIndex),
        }
    }
}

/// The three build stages, run in order.
pub struct Pipeline {
    pub street: StreetStage,
    pub transit: TransitStage,
    pub index: IndexStage,
}

impl Pipeline {
    /// Select stages from a configuration.
    pub fn from_config(config: &BuildConfig) -> Self {
        let street = match &config.street_file {
            Some(path) => StreetStage::File(path.clone()),
            None => StreetStage::Empty,
        };
        let index = if config.spatial_index {
            IndexStage::Spatial
        } else {
            IndexStage::None
        };
        Self {
            street,
            transit: TransitStage::new(config.clone()),
            index,
        }
    }

    pub async fn run(self, feeds: BTreeMap<FeedId, Feed>) -> Result<Network, BuildError> {
        let streets = self.street.run()?;
        info!(
            nodes = streets.node_count(),
            edges = streets.edge_count(),
            "Street graph ready"
        );

        let output = self.transit.run(streets, feeds).await?;
        let index = self.index.run(&output.graph);

        let network = Network::new(
            output.graph,
            output.timetable,
            output.transfers,
            index,
            Utc::now(),
        );
        network.validate()?;

        let summary = network.summary();
        info!(
            nodes = summary.nodes,
            edges = summary.edges,
            stations = summary.stations,
            trips = summary.trips,
            transfers = summary.transfers,
            "Network built"
        );
        Ok(network)
    }
}
