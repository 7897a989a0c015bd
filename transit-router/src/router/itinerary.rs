//! Itineraries rebuilt from label paths.

use crate::domain::{FeedId, NodeId, Time};
use crate::graph::{Edge, EdgeKind, Graph, Timetable};

use super::config::Direction;
use super::label::Label;
use super::search::SearchError;

/// One part of an itinerary.
#[derive(Debug, Clone, PartialEq)]
pub enum Leg {
    /// Walking over streets, including access to and egress from stations.
    Walk {
        from: NodeId,
        to: NodeId,
        departure: Time,
        arrival: Time,
        distance_m: f64,
    },
    /// Riding one trip between two stations.
    Transit {
        feed: FeedId,
        trip_id: String,
        from: NodeId,
        to: NodeId,
        departure: Time,
        arrival: Time,
        /// Number of ride edges used.
        hops: u32,
    },
    /// A station-to-station transfer.
    Transfer {
        from: NodeId,
        to: NodeId,
        departure: Time,
        arrival: Time,
    },
}

impl Leg {
    pub fn departure(&self) -> Time {
        match self {
            Leg::Walk { departure, .. }
            | Leg::Transit { departure, .. }
            | Leg::Transfer { departure, .. } => *departure,
        }
    }

    pub fn arrival(&self) -> Time {
        match self {
            Leg::Walk { arrival, .. } | Leg::Transit { arrival, .. } | Leg::Transfer { arrival, .. } => {
                *arrival
            }
        }
    }
}

/// A complete journey between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    pub departure: Time,
    pub arrival: Time,
    pub transfers: u32,
    pub walk_m: f64,
    pub legs: Vec<Leg>,
}

impl Itinerary {
    /// Total duration in seconds.
    pub fn duration_secs(&self) -> i64 {
        self.arrival.since(self.departure)
    }

    /// Build an itinerary from the labels of a search path, seed first.
    ///
    /// Backward paths start at the destination and are replayed in travel
    /// order.
    pub fn from_path(
        graph: &Graph,
        timetable: &Timetable,
        path: &[Label],
        direction: Direction,
    ) -> Result<Self, SearchError> {
        let (Some(first), Some(last)) = (path.first(), path.last()) else {
            return Err(SearchError::Inconsistent("empty label path".to_string()));
        };

        // (edge, time entering the edge, time leaving it) in travel order.
        let mut steps = Vec::with_capacity(path.len().saturating_sub(1));
        for pair in path.windows(2) {
            let (earlier, later) = (&pair[0], &pair[1]);
            let edge_id = later.edge.ok_or_else(|| {
                SearchError::Inconsistent("label without edge after the seed".to_string())
            })?;
            let edge = graph
                .edge(edge_id)
                .ok_or_else(|| SearchError::Inconsistent(format!("edge {edge_id:?} does not exist")))?;
            match direction {
                Direction::Forward => steps.push((edge, earlier.time, later.time)),
                Direction::Backward => steps.push((edge, later.time, earlier.time)),
            }
        }
        if direction == Direction::Backward {
            steps.reverse();
        }

        let (departure, arrival) = match direction {
            Direction::Forward => (first.time, last.time),
            Direction::Backward => (last.time, first.time),
        };

        Ok(Itinerary {
            departure,
            arrival,
            transfers: last.transfers(),
            walk_m: last.walk_distance_m(),
            legs: legs(timetable, &steps)?,
        })
    }
}

fn legs(timetable: &Timetable, steps: &[(&Edge, Time, Time)]) -> Result<Vec<Leg>, SearchError> {
    let mut legs: Vec<Leg> = Vec::new();

    for &(edge, enter, leave) in steps {
        match edge.kind {
            EdgeKind::Street { .. } | EdgeKind::Access { .. } | EdgeKind::Egress { .. } => {
                let length_m = match edge.kind {
                    EdgeKind::Street { length_mm } => length_mm as f64 / 1000.0,
                    _ => 0.0,
                };
                if let Some(Leg::Walk {
                    to,
                    arrival,
                    distance_m,
                    ..
                }) = legs.last_mut()
                {
                    *to = edge.to;
                    *arrival = leave;
                    *distance_m += length_m;
                } else {
                    legs.push(Leg::Walk {
                        from: edge.from,
                        to: edge.to,
                        departure: enter,
                        arrival: leave,
                        distance_m: length_m,
                    });
                }
            }
            EdgeKind::Transfer { .. } => legs.push(Leg::Transfer {
                from: edge.from,
                to: edge.to,
                departure: enter,
                arrival: leave,
            }),
            EdgeKind::Board { trip, .. } => {
                let schedule = timetable.trip(trip).ok_or_else(|| {
                    SearchError::Inconsistent(format!("trip {trip:?} is not in the timetable"))
                })?;
                legs.push(Leg::Transit {
                    feed: schedule.feed.clone(),
                    trip_id: schedule.trip_id.clone(),
                    from: edge.from,
                    to: edge.from,
                    departure: leave,
                    arrival: leave,
                    hops: 0,
                });
            }
            EdgeKind::Ride { .. } | EdgeKind::Dwell { .. } | EdgeKind::Alight { .. } => {
                let Some(Leg::Transit {
                    to, arrival, hops, ..
                }) = legs.last_mut()
                else {
                    return Err(SearchError::Inconsistent(
                        "vehicle edge outside a transit leg".to_string(),
                    ));
                };
                match edge.kind {
                    EdgeKind::Ride { .. } => {
                        *hops += 1;
                        *arrival = leave;
                    }
                    EdgeKind::Alight { .. } => *to = edge.to,
                    _ => {}
                }
            }
        }
    }

    Ok(legs)
}
