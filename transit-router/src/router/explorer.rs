//! Time-dependent traversal of the combined street and transit graph.

use std::collections::BTreeMap;

use crate::domain::{EdgeId, NodeId, PatternId, Time, TripIdx};
use crate::graph::{Edge, EdgeKind, Graph, ScheduledStop, Timetable};

use super::config::{Direction, RouterConfig};
use super::label::{Label, LabelId};
use super::search::SearchError;

/// Expands labels along the admissible edges of a graph.
pub struct GraphExplorer<'a> {
    graph: &'a Graph,
    timetable: &'a Timetable,
    config: &'a RouterConfig,
    direction: Direction,
}

/// The best trip found so far for one (pattern, position) pair.
struct TripChoice {
    edge: EdgeId,
    next: NodeId,
    time: Time,
}

impl<'a> GraphExplorer<'a> {
    pub fn new(
        graph: &'a Graph,
        timetable: &'a Timetable,
        config: &'a RouterConfig,
        direction: Direction,
    ) -> Self {
        Self {
            graph,
            timetable,
            config,
            direction,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Push every successor of `label` (stored as `id`) into `out`.
    ///
    /// Forward successors follow outgoing edges with non-decreasing times;
    /// backward successors follow incoming edges with non-increasing times.
    pub fn expand(
        &self,
        id: LabelId,
        label: &Label,
        out: &mut Vec<Label>,
    ) -> Result<(), SearchError> {
        match self.direction {
            Direction::Forward => self.expand_forward(id, label, out),
            Direction::Backward => self.expand_backward(id, label, out),
        }
    }

    fn expand_forward(
        &self,
        id: LabelId,
        label: &Label,
        out: &mut Vec<Label>,
    ) -> Result<(), SearchError> {
        let allow = self.config.allowlist;
        let mut boardings: BTreeMap<(PatternId, u32), TripChoice> = BTreeMap::new();

        for &edge_id in self.graph.out_edges(label.node) {
            let edge = self.edge(edge_id)?;
            if !allow.allows(edge.kind.class()) {
                continue;
            }
            let next = |time: Time| Label {
                time,
                node: edge.to,
                parent: Some(id),
                edge: Some(edge_id),
                ..*label
            };

            match edge.kind {
                EdgeKind::Street { length_mm } => out.push(Label {
                    walk_mm: label.walk_mm + length_mm,
                    ..next(label.time + self.config.walk_secs(length_mm))
                }),
                EdgeKind::Access { secs } | EdgeKind::Egress { secs } => {
                    out.push(next(label.time + secs))
                }
                EdgeKind::Transfer { secs } => out.push(next(label.time + secs)),
                EdgeKind::Board { trip, position } => {
                    let (pattern, stop) = self.scheduled(trip, position)?;
                    if label.time + self.config.board_penalty_secs > stop.departure {
                        continue;
                    }
                    let candidate = TripChoice {
                        edge: edge_id,
                        next: edge.to,
                        time: stop.departure,
                    };
                    keep_best(&mut boardings, (pattern, position), candidate, |new, old| new < old);
                }
                EdgeKind::Ride { trip, position } => {
                    let (_, here) = self.scheduled(trip, position)?;
                    let (_, there) = self.scheduled(trip, position + 1)?;
                    out.push(next(label.time + there.arrival.since(here.departure)));
                }
                EdgeKind::Dwell { trip, position } => {
                    let (_, stop) = self.scheduled(trip, position)?;
                    out.push(next(label.time + stop.departure.since(stop.arrival)));
                }
                EdgeKind::Alight { .. } => {
                    out.push(next(label.time + self.config.alight_penalty_secs))
                }
            }
        }

        out.extend(boardings.into_values().map(|choice| Label {
            time: choice.time,
            boardings: label.boardings + 1,
            node: choice.next,
            parent: Some(id),
            edge: Some(choice.edge),
            ..*label
        }));
        Ok(())
    }

    fn expand_backward(
        &self,
        id: LabelId,
        label: &Label,
        out: &mut Vec<Label>,
    ) -> Result<(), SearchError> {
        let allow = self.config.allowlist;
        let mut alightings: BTreeMap<(PatternId, u32), TripChoice> = BTreeMap::new();

        for &edge_id in self.graph.in_edges(label.node) {
            let edge = self.edge(edge_id)?;
            if !allow.allows(edge.kind.class()) {
                continue;
            }
            let prev = |time: Time| Label {
                time,
                node: edge.from,
                parent: Some(id),
                edge: Some(edge_id),
                ..*label
            };

            match edge.kind {
                EdgeKind::Street { length_mm } => out.push(Label {
                    walk_mm: label.walk_mm + length_mm,
                    ..prev(label.time - self.config.walk_secs(length_mm))
                }),
                EdgeKind::Access { secs } | EdgeKind::Egress { secs } => {
                    out.push(prev(label.time - secs))
                }
                EdgeKind::Transfer { secs } => out.push(prev(label.time - secs)),
                EdgeKind::Alight { trip, position } => {
                    let (pattern, stop) = self.scheduled(trip, position)?;
                    if stop.arrival + self.config.alight_penalty_secs > label.time {
                        continue;
                    }
                    let candidate = TripChoice {
                        edge: edge_id,
                        next: edge.from,
                        time: stop.arrival,
                    };
                    keep_best(&mut alightings, (pattern, position), candidate, |new, old| new > old);
                }
                EdgeKind::Ride { trip, position } => {
                    let (_, here) = self.scheduled(trip, position)?;
                    let (_, there) = self.scheduled(trip, position + 1)?;
                    out.push(prev(label.time - there.arrival.since(here.departure)));
                }
                EdgeKind::Dwell { trip, position } => {
                    let (_, stop) = self.scheduled(trip, position)?;
                    out.push(prev(label.time - stop.departure.since(stop.arrival)));
                }
                EdgeKind::Board { .. } => {
                    out.push(prev(label.time - self.config.board_penalty_secs))
                }
            }
        }

        // Arriving by a deadline, the vehicle is entered at the alighting
        // edge, so that is where the boarding is counted.
        out.extend(alightings.into_values().map(|choice| Label {
            time: choice.time,
            boardings: label.boardings + 1,
            node: choice.next,
            parent: Some(id),
            edge: Some(choice.edge),
            ..*label
        }));
        Ok(())
    }

    fn edge(&self, id: EdgeId) -> Result<&'a Edge, SearchError> {
        self.graph
            .edge(id)
            .ok_or_else(|| SearchError::Inconsistent(format!("edge {id:?} does not exist")))
    }

    fn scheduled(
        &self,
        trip: TripIdx,
        position: u32,
    ) -> Result<(PatternId, &'a ScheduledStop), SearchError> {
        let schedule = self.timetable.trip(trip).ok_or_else(|| {
            SearchError::Inconsistent(format!("trip {trip:?} is not in the timetable"))
        })?;
        let stop = schedule.stop(position).ok_or_else(|| {
            SearchError::Inconsistent(format!(
                "trip {} has no stop at position {position}",
                schedule.trip_id
            ))
        })?;
        Ok((schedule.pattern, stop))
    }
}

/// Keep `candidate` for `key` unless the incumbent's time is at least as
/// good. Ties keep the first edge seen.
fn keep_best(
    choices: &mut BTreeMap<(PatternId, u32), TripChoice>,
    key: (PatternId, u32),
    candidate: TripChoice,
    better: impl Fn(Time, Time) -> bool,
) {
    match choices.get(&key) {
        Some(best) if !better(candidate.time, best.time) => {}
        _ => {
            choices.insert(key, candidate);
        }
    }
}
