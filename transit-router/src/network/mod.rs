//! The finished multimodal network.
//!
//! A [`Network`] is immutable once built. Queries share it through an
//! `Arc` and never mutate it.

pub mod store;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Coord, NodeId, StopKey};
use crate::feed::TransferKind;
use crate::graph::{EdgeKind, Graph, NodeKind, Timetable};
use crate::index::{self, EmptyIndex, LocationIndex};

/// A transfer record as it was committed to the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTransfer {
    pub from: StopKey,
    pub to: StopKey,
    /// Never `Recommended`: those are resolved to `MinimumTime`.
    pub kind: TransferKind,
    pub secs: Option<i64>,
}

/// The network is internally inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("inconsistent network: {0}")]
pub struct InconsistentNetwork(pub String);

/// Graph, timetable and spatial index of a built network.
#[derive(Serialize, Deserialize)]
pub struct Network {
    pub graph: Graph,
    pub timetable: Timetable,
    pub transfers: Vec<ResolvedTransfer>,
    pub built_at: DateTime<Utc>,
    #[serde(skip)]
    stations: BTreeMap<StopKey, NodeId>,
    #[serde(skip, default = "empty_index")]
    index: Arc<dyn LocationIndex>,
}

fn empty_index() -> Arc<dyn LocationIndex> {
    Arc::new(EmptyIndex)
}

/// Counts describing a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkSummary {
    pub nodes: usize,
    pub edges: usize,
    pub stations: usize,
    pub trips: usize,
    pub patterns: usize,
    pub transfers: usize,
    pub built_at: DateTime<Utc>,
}

impl Network {
    pub fn new(
        graph: Graph,
        timetable: Timetable,
        transfers: Vec<ResolvedTransfer>,
        index: Arc<dyn LocationIndex>,
        built_at: DateTime<Utc>,
    ) -> Self {
        let stations = station_map(&graph);
        Self {
            graph,
            timetable,
            transfers,
            built_at,
            stations,
            index,
        }
    }

    /// Rebuild the parts that are not persisted: the station lookup and the
    /// spatial index.
    pub fn restore(mut self) -> Self {
        self.stations = station_map(&self.graph);
        self.index = index::complete(&self.graph);
        self
    }

    /// The station node of a stop.
    pub fn station(&self, stop: &StopKey) -> Option<NodeId> {
        self.stations.get(stop).copied()
    }

    pub fn stations(&self) -> impl Iterator<Item = (&StopKey, NodeId)> {
        self.stations.iter().map(|(k, v)| (k, *v))
    }

    pub fn index(&self) -> &dyn LocationIndex {
        self.index.as_ref()
    }

    /// The street or station node closest to `coord`.
    pub fn snap(&self, coord: Coord) -> Option<NodeId> {
        self.index.nearest_node(coord)
    }

    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            nodes: self.graph.node_count(),
            edges: self.graph.edge_count(),
            stations: self.stations.len(),
            trips: self.timetable.len(),
            patterns: self.timetable.pattern_count(),
            transfers: self.transfers.len(),
            built_at: self.built_at,
        }
    }

    /// Check that every trip edge refers to a scheduled stop, that ride
    /// edges follow stop order without going back in time, and that no
    /// transfer is left unresolved.
    pub fn validate(&self) -> Result<(), InconsistentNetwork> {
        for (id, edge) in self.graph.edges() {
            if !self.graph.contains_node(edge.from) || !self.graph.contains_node(edge.to) {
                return Err(InconsistentNetwork(format!(
                    "edge {id:?} has a missing endpoint"
                )));
            }
            let (trip, position) = match edge.kind {
                EdgeKind::Board { trip, position }
                | EdgeKind::Ride { trip, position }
                | EdgeKind::Dwell { trip, position }
                | EdgeKind::Alight { trip, position } => (trip, position),
                EdgeKind::Transfer { secs } | EdgeKind::Access { secs } | EdgeKind::Egress { secs }
                    if secs < 0 =>
                {
                    return Err(InconsistentNetwork(format!(
                        "edge {id:?} has negative cost {secs}"
                    )));
                }
                _ => continue,
            };
            let schedule = self.timetable.trip(trip).ok_or_else(|| {
                InconsistentNetwork(format!("edge {id:?} refers to unknown trip {trip:?}"))
            })?;
            let stop = schedule.stop(position).ok_or_else(|| {
                InconsistentNetwork(format!(
                    "edge {id:?} refers to position {position} of trip {}",
                    schedule.trip_id
                ))
            })?;
            if let EdgeKind::Ride { .. } = edge.kind {
                let next = schedule.stop(position + 1).ok_or_else(|| {
                    InconsistentNetwork(format!(
                        "ride edge {id:?} leaves the last stop of trip {}",
                        schedule.trip_id
                    ))
                })?;
                if edge.from != stop.departure_node || edge.to != next.arrival_node {
                    return Err(InconsistentNetwork(format!(
                        "ride edge {id:?} does not follow trip {}",
                        schedule.trip_id
                    )));
                }
                if next.arrival < stop.departure {
                    return Err(InconsistentNetwork(format!(
                        "trip {} goes back in time after position {position}",
                        schedule.trip_id
                    )));
                }
            }
        }

        for (_, node) in self.graph.nodes() {
            let (NodeKind::TripDeparture { trip, .. } | NodeKind::TripArrival { trip, .. }) =
                &node.kind
            else {
                continue;
            };
            if self.timetable.trip(*trip).is_none() {
                return Err(InconsistentNetwork(format!(
                    "trip node refers to unknown trip {trip:?}"
                )));
            }
        }

        if let Some(t) = self
            .transfers
            .iter()
            .find(|t| t.kind == TransferKind::Recommended)
        {
            return Err(InconsistentNetwork(format!(
                "transfer {} -> {} was never resolved",
                t.from, t.to
            )));
        }

        Ok(())
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("summary", &self.summary())
            .finish_non_exhaustive()
    }
}

fn station_map(graph: &Graph) -> BTreeMap<StopKey, NodeId> {
    graph
        .nodes()
        .filter_map(|(id, node)| match &node.kind {
            NodeKind::Station { stop } => Some((stop.clone(), id)),
            _ => None,
        })
        .collect()
}
