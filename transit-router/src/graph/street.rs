//! Street network import.
//!
//! Streets arrive as a small JSON document: points with coordinates and the
//! ways connecting them. Ways without a length get their great-circle
//! length. The resulting graph only contains street nodes and edges; the
//! transit part is stitched on by the network builder.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{Coord, NodeId};

use super::{EdgeKind, Graph, NodeKind};

/// Errors while importing a street network.
#[derive(Debug, thiserror::Error)]
pub enum StreetError {
    #[error("failed to read street file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse street file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("way references unknown street node {0}")]
    UnknownNode(u64),

    #[error("street node {0} is defined twice")]
    DuplicateNode(u64),
}

/// A street point as it appears in the input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreetPoint {
    pub id: u64,
    pub lat: f64,
    pub lon: f64,
}

/// A walkable street segment between two points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreetWay {
    pub from: u64,
    pub to: u64,
    #[serde(default)]
    pub length_m: Option<f64>,
    #[serde(default)]
    pub oneway: bool,
}

/// The street network input document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreetNetwork {
    pub nodes: Vec<StreetPoint>,
    pub ways: Vec<StreetWay>,
}

impl StreetNetwork {
    /// Read a street network from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StreetError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Build the street graph.
    ///
    /// Nodes keep their input order, so the same document always produces the
    /// same node ids.
    pub fn into_graph(self) -> Result<Graph, StreetError> {
        let mut graph = Graph::new();
        let mut ids: HashMap<u64, (NodeId, Coord)> = HashMap::with_capacity(self.nodes.len());

        for point in &self.nodes {
            let coord = Coord::new(point.lat, point.lon);
            let node = graph.add_node(coord, NodeKind::Street);
            if ids.insert(point.id, (node, coord)).is_some() {
                return Err(StreetError::DuplicateNode(point.id));
            }
        }

        for way in &self.ways {
            let (from, from_coord) = *ids
                .get(&way.from)
                .ok_or(StreetError::UnknownNode(way.from))?;
            let (to, to_coord) = *ids.get(&way.to).ok_or(StreetError::UnknownNode(way.to))?;
            let length_m = way
                .length_m
                .unwrap_or_else(|| from_coord.distance_m(to_coord));
            if way.oneway {
                let length_mm = (length_m.max(0.0) * 1000.0).round() as u64;
                graph.add_edge(from, to, EdgeKind::Street { length_mm });
            } else {
                graph.add_street(from, to, length_m);
            }
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Imported street network"
        );
        Ok(graph)
    }
}
