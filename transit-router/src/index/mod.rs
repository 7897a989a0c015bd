//! Spatial index for snapping coordinates onto the graph.
//!
//! The builder snaps stops with a street-only index; once every feed is in
//! the graph a complete index over street and station nodes replaces it.
//! An index is never updated in place: rebuilding means constructing a new
//! one over the current graph.

use std::sync::Arc;

use rstar::RTree;
use rstar::primitives::{GeomWithData, Line};
use tracing::debug;

use crate::domain::{Coord, EdgeId, NodeId};
use crate::graph::{EdgeClass, Graph, Node};

/// Nearest-neighbour oracle over graph nodes and edges.
pub trait LocationIndex: Send + Sync {
    /// The indexed node closest to `coord`.
    fn nearest_node(&self, coord: Coord) -> Option<NodeId>;

    /// The indexed edge closest to `coord`.
    fn nearest_edge(&self, coord: Coord) -> Option<EdgeId>;
}

type NodeEntry = GeomWithData<[f64; 2], NodeId>;
type EdgeEntry = GeomWithData<Line<[f64; 2]>, EdgeId>;

/// R-tree backed index.
pub struct RTreeIndex {
    nodes: RTree<NodeEntry>,
    edges: RTree<EdgeEntry>,
}

impl RTreeIndex {
    /// Index the nodes accepted by `keep_node` and the edges of the given
    /// classes whose endpoints are both indexed.
    pub fn build(
        graph: &Graph,
        keep_node: impl Fn(&Node) -> bool,
        edge_classes: &[EdgeClass],
    ) -> Self {
        let mut indexed = vec![false; graph.node_count()];
        let mut node_entries = Vec::new();
        for (id, node) in graph.nodes() {
            if keep_node(node) {
                indexed[id.index()] = true;
                node_entries.push(GeomWithData::new(node.coord.to_xy(), id));
            }
        }

        let mut edge_entries = Vec::new();
        for (id, edge) in graph.edges() {
            if !edge_classes.contains(&edge.kind.class())
                || !indexed[edge.from.index()]
                || !indexed[edge.to.index()]
            {
                continue;
            }
            let (Some(from), Some(to)) = (graph.node(edge.from), graph.node(edge.to)) else {
                continue;
            };
            edge_entries.push(GeomWithData::new(
                Line::new(from.coord.to_xy(), to.coord.to_xy()),
                id,
            ));
        }

        debug!(
            nodes = node_entries.len(),
            edges = edge_entries.len(),
            "Built spatial index"
        );

        Self {
            nodes: RTree::bulk_load(node_entries),
            edges: RTree::bulk_load(edge_entries),
        }
    }

    /// Street nodes and street edges only; used while snapping stops.
    pub fn streets(graph: &Graph) -> Self {
        Self::build(graph, Node::is_street, &[EdgeClass::Street])
    }

    /// Street and station nodes, with street and access/egress edges.
    pub fn complete(graph: &Graph) -> Self {
        Self::build(
            graph,
            |n| n.is_street() || n.is_station(),
            &[EdgeClass::Street, EdgeClass::Access, EdgeClass::Egress],
        )
    }

    pub fn node_count(&self) -> usize {
        self.nodes.size()
    }
}

impl LocationIndex for RTreeIndex {
    fn nearest_node(&self, coord: Coord) -> Option<NodeId> {
        self.nodes.nearest_neighbor(&coord.to_xy()).map(|e| e.data)
    }

    fn nearest_edge(&self, coord: Coord) -> Option<EdgeId> {
        self.edges.nearest_neighbor(&coord.to_xy()).map(|e| e.data)
    }
}

/// Index over a graph without nodes. Every query misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyIndex;

impl LocationIndex for EmptyIndex {
    fn nearest_node(&self, _coord: Coord) -> Option<NodeId> {
        None
    }

    fn nearest_edge(&self, _coord: Coord) -> Option<EdgeId> {
        None
    }
}

/// The complete index for a finished graph: an R-tree, or the empty index
/// when the graph has no nodes.
pub fn complete(graph: &Graph) -> Arc<dyn LocationIndex> {
    if graph.node_count() == 0 {
        Arc::new(EmptyIndex)
    } else {
        Arc::new(RTreeIndex::complete(graph))
    }
}

/// The point of segment `a`-`b` closest to `coord`, in degree space.
pub fn project_onto_segment(coord: Coord, a: Coord, b: Coord) -> Coord {
    let line = Line::new(a.to_xy(), b.to_xy());
    Coord::from_xy(line.nearest_point(&coord.to_xy()))
}
