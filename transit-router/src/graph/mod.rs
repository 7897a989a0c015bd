//! Combined street/transit graph storage.
//!
//! A plain adjacency-array graph. Nodes and edges are appended while the
//! network is built and never change afterwards; the router only reads
//! through the accessors below.

pub mod street;
mod timetable;

use serde::{Deserialize, Serialize};

use crate::domain::{Coord, EdgeId, NodeId, StopKey, TripIdx};

pub use timetable::{ScheduledStop, Timetable, TripSchedule};

/// What a node stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A point of the street network.
    Street,
    /// A stop's platform, independent of time.
    Station { stop: StopKey },
    /// A trip about to leave the stop at `position`.
    TripDeparture { trip: TripIdx, position: u32 },
    /// A trip having arrived at the stop at `position`.
    TripArrival { trip: TripIdx, position: u32 },
}

/// A graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub coord: Coord,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_station(&self) -> bool {
        matches!(self.kind, NodeKind::Station { .. })
    }

    pub fn is_street(&self) -> bool {
        matches!(self.kind, NodeKind::Street)
    }
}

/// Edge type together with the data its cost rule needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// One direction of a street segment.
    Street { length_mm: u64 },
    /// Street node to station.
    Access { secs: i64 },
    /// Station to street node.
    Egress { secs: i64 },
    /// Station to a trip's departure node.
    Board { trip: TripIdx, position: u32 },
    /// Departure node at `position` to arrival node at `position + 1`.
    Ride { trip: TripIdx, position: u32 },
    /// Arrival node to departure node at the same stop, staying on board.
    Dwell { trip: TripIdx, position: u32 },
    /// A trip's arrival node to the station.
    Alight { trip: TripIdx, position: u32 },
    /// Station to station, with the resolved minimum duration.
    Transfer { secs: i64 },
}

impl EdgeKind {
    pub fn class(&self) -> EdgeClass {
        match self {
            EdgeKind::Street { .. } => EdgeClass::Street,
            EdgeKind::Access { .. } => EdgeClass::Access,
            EdgeKind::Egress { .. } => EdgeClass::Egress,
            EdgeKind::Board { .. } => EdgeClass::Board,
            EdgeKind::Ride { .. } => EdgeClass::Ride,
            EdgeKind::Dwell { .. } => EdgeClass::Dwell,
            EdgeKind::Alight { .. } => EdgeClass::Alight,
            EdgeKind::Transfer { .. } => EdgeClass::Transfer,
        }
    }
}

/// Edge types without their data, for allowlists and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeClass {
    Street,
    Access,
    Egress,
    Board,
    Ride,
    Dwell,
    Alight,
    Transfer,
}

impl EdgeClass {
    pub const ALL: [EdgeClass; 8] = [
        EdgeClass::Street,
        EdgeClass::Access,
        EdgeClass::Egress,
        EdgeClass::Board,
        EdgeClass::Ride,
        EdgeClass::Dwell,
        EdgeClass::Alight,
        EdgeClass::Transfer,
    ];

    pub(crate) fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// A directed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
}

/// The graph itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    out_edges: Vec<Vec<EdgeId>>,
    in_edges: Vec<Vec<EdgeId>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node.
    pub fn add_node(&mut self, coord: Coord, kind: NodeKind) -> NodeId {
        let id = NodeId::from(self.nodes.len());
        self.nodes.push(Node { coord, kind });
        self.out_edges.push(Vec::new());
        self.in_edges.push(Vec::new());
        id
    }

    /// Append a directed edge. Both endpoints must exist.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) -> EdgeId {
        debug_assert!(from.index() < self.nodes.len() && to.index() < self.nodes.len());
        let id = EdgeId::from(self.edges.len());
        self.edges.push(Edge { from, to, kind });
        self.out_edges[from.index()].push(id);
        self.in_edges[to.index()].push(id);
        id
    }

    /// Add a street segment in both directions.
    pub fn add_street(&mut self, a: NodeId, b: NodeId, length_m: f64) -> (EdgeId, EdgeId) {
        let length_mm = (length_m.max(0.0) * 1000.0).round() as u64;
        let forward = self.add_edge(a, b, EdgeKind::Street { length_mm });
        let backward = self.add_edge(b, a, EdgeKind::Street { length_mm });
        (forward, backward)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Outgoing edges of a node; empty for unknown nodes.
    pub fn out_edges(&self, id: NodeId) -> &[EdgeId] {
        self.out_edges.get(id.index()).map_or(&[], Vec::as_slice)
    }

    /// Incoming edges of a node; empty for unknown nodes.
    pub fn in_edges(&self, id: NodeId) -> &[EdgeId] {
        self.in_edges.get(id.index()).map_or(&[], Vec::as_slice)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All nodes with their ids.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId::from(i), n))
    }

    /// All edges with their ids.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (EdgeId::from(i), e))
    }
}
