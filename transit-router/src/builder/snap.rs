//! Snapping stops onto the street network.

use crate::domain::{Coord, NodeId};
use crate::graph::Graph;
use crate::index::{LocationIndex, project_onto_segment};

/// Finds the street node a stop connects to.
pub struct Snapper<'a> {
    graph: &'a Graph,
    index: &'a dyn LocationIndex,
    radius_m: f64,
}

impl<'a> Snapper<'a> {
    pub fn new(graph: &'a Graph, index: &'a dyn LocationIndex, radius_m: f64) -> Self {
        Self {
            graph,
            index,
            radius_m,
        }
    }

    /// The street node for `coord`, or `None` if no street is within the
    /// snap radius.
    ///
    /// The point is projected onto the nearest street edge and then moved
    /// to the closer endpoint of that edge. Without a usable edge the
    /// nearest node within the radius is taken instead.
    pub fn snap(&self, coord: Coord) -> Option<NodeId> {
        self.snap_to_edge(coord).or_else(|| self.snap_to_node(coord))
    }

    fn snap_to_edge(&self, coord: Coord) -> Option<NodeId> {
        let edge = self.graph.edge(self.index.nearest_edge(coord)?)?;
        let a = self.graph.node(edge.from)?.coord;
        let b = self.graph.node(edge.to)?.coord;

        let projected = project_onto_segment(coord, a, b);
        if coord.distance_m(projected) > self.radius_m {
            return None;
        }
        if projected.distance_m(a) <= projected.distance_m(b) {
            Some(edge.from)
        } else {
            Some(edge.to)
        }
    }

    fn snap_to_node(&self, coord: Coord) -> Option<NodeId> {
        let id = self.index.nearest_node(coord)?;
        let node = self.graph.node(id)?;
        (coord.distance_m(node.coord) <= self.radius_m).then_some(id)
    }
}
