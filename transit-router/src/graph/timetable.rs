//! Trip schedules referenced by board, ride, dwell and alight edges.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{FeedId, NodeId, PatternId, Time, TripIdx};

/// A trip's call at one station, with the trip nodes created for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledStop {
    pub station: NodeId,
    pub arrival: Time,
    pub departure: Time,
    pub arrival_node: NodeId,
    pub departure_node: NodeId,
}

/// One materialized trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripSchedule {
    pub feed: FeedId,
    pub trip_id: String,
    pub pattern: PatternId,
    pub stops: Vec<ScheduledStop>,
}

impl TripSchedule {
    pub fn stop(&self, position: u32) -> Option<&ScheduledStop> {
        self.stops.get(position as usize)
    }
}

/// All trips of the network.
///
/// Trips share a pattern only when they call at the same stations and keep
/// the same order at every call, so the earliest departure of a pattern
/// from a stop also arrives first everywhere downstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timetable {
    trips: Vec<TripSchedule>,
    pattern_count: u32,
    /// Only needed while trips are being added.
    #[serde(skip)]
    patterns: HashMap<Vec<NodeId>, Vec<PatternId>>,
    #[serde(skip)]
    members: Vec<Vec<TripIdx>>,
}

impl Timetable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the index the next added trip will get.
    pub fn next_index(&self) -> TripIdx {
        TripIdx::from(self.trips.len())
    }

    /// Add a trip, assigning it the first pattern of its station sequence
    /// it does not overtake, or a new one.
    pub fn add_trip(&mut self, feed: FeedId, trip_id: String, stops: Vec<ScheduledStop>) -> TripIdx {
        let idx = self.next_index();
        let key: Vec<NodeId> = stops.iter().map(|s| s.station).collect();
        let candidates = self.patterns.get(&key).map(Vec::as_slice).unwrap_or_default();
        let existing = candidates.iter().copied().find(|pattern| {
            self.members[pattern.index()]
                .iter()
                .filter_map(|&member| self.trip(member))
                .all(|member| in_order(&member.stops, &stops))
        });
        let pattern = match existing {
            Some(pattern) => pattern,
            None => {
                let pattern = PatternId(self.pattern_count);
                self.pattern_count += 1;
                self.members.push(Vec::new());
                self.patterns.entry(key).or_default().push(pattern);
                pattern
            }
        };
        self.members[pattern.index()].push(idx);

        self.trips.push(TripSchedule {
            feed,
            trip_id,
            pattern,
            stops,
        });
        idx
    }

    pub fn trip(&self, idx: TripIdx) -> Option<&TripSchedule> {
        self.trips.get(idx.index())
    }

    pub fn trips(&self) -> impl Iterator<Item = (TripIdx, &TripSchedule)> {
        self.trips
            .iter()
            .enumerate()
            .map(|(i, t)| (TripIdx::from(i), t))
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn pattern_count(&self) -> usize {
        self.pattern_count as usize
    }
}

/// Whether two trips over the same stations are ordered the same way at
/// every arrival and departure. A tie at some calls but not all of them
/// counts as out of order.
fn in_order(a: &[ScheduledStop], b: &[ScheduledStop]) -> bool {
    let mut order = a
        .iter()
        .zip(b)
        .flat_map(|(x, y)| [x.arrival.cmp(&y.arrival), x.departure.cmp(&y.departure)]);
    match order.next() {
        Some(first) => order.all(|o| o == first),
        None => true,
    }
}
