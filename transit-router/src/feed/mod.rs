//! In-memory timetable feed model.
//!
//! A feed is the parsed form of one timetable archive: stops with
//! coordinates, trips with ordered stop times, and declared transfers.
//! Parsing the archive format itself lives in [`gtfs`]; everything
//! downstream only sees these types.

mod error;
pub mod gtfs;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Coord, Time};

pub use error::FeedError;

/// A stop (platform or station) with its location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub coord: Coord,
}

/// A scheduled call of a trip at a stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopTime {
    pub stop_id: String,
    pub sequence: u32,
    pub arrival: Time,
    pub departure: Time,
}

/// One scheduled vehicle run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    stop_times: Vec<StopTime>,
}

impl Trip {
    /// Create a trip; stop times are ordered by their sequence number.
    pub fn new(id: impl Into<String>, mut stop_times: Vec<StopTime>) -> Self {
        stop_times.sort_by_key(|st| st.sequence);
        Self {
            id: id.into(),
            stop_times,
        }
    }

    /// Stop times in stop-sequence order.
    pub fn stop_times(&self) -> &[StopTime] {
        &self.stop_times
    }
}

/// Transfer kinds, with their numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferKind {
    /// 0: recommended transfer point, duration unspecified
    Recommended,
    /// 1: transfers are not possible between these stops
    Impossible,
    /// 2: a minimum transfer time is given
    MinimumTime,
    /// 3: the traveler stays in the same vehicle
    InSeat,
}

impl TransferKind {
    pub fn code(self) -> u8 {
        match self {
            TransferKind::Recommended => 0,
            TransferKind::Impossible => 1,
            TransferKind::MinimumTime => 2,
            TransferKind::InSeat => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(TransferKind::Recommended),
            1 => Some(TransferKind::Impossible),
            2 => Some(TransferKind::MinimumTime),
            3 => Some(TransferKind::InSeat),
            _ => None,
        }
    }
}

/// A declared connection between two stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from_stop: String,
    pub to_stop: String,
    pub kind: TransferKind,
    /// Minimum transfer time in seconds, required for `MinimumTime`.
    pub min_transfer_secs: Option<i64>,
}

/// A parsed timetable feed.
///
/// Stops and trips are kept in id order so that building a network from the
/// same feed twice produces the same node and edge numbering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub stops: BTreeMap<String, Stop>,
    pub trips: BTreeMap<String, Trip>,
    pub transfers: Vec<Transfer>,
}

impl Feed {
    /// Create an empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a feed with the fluent API.
    pub fn builder() -> FeedBuilder {
        FeedBuilder::default()
    }

    /// Check the feed for input errors.
    ///
    /// Transfers referencing unknown stops are not checked here: the network
    /// builder treats them as consistency errors.
    pub fn validate(&self) -> Result<(), FeedError> {
        for trip in self.trips.values() {
            let stop_times = trip.stop_times();
            if stop_times.len() < 2 {
                return Err(FeedError::TooFewStopTimes(trip.id.clone()));
            }

            let mut previous: Option<&StopTime> = None;
            for st in stop_times {
                if !self.stops.contains_key(&st.stop_id) {
                    return Err(FeedError::UnknownStop {
                        trip: trip.id.clone(),
                        stop: st.stop_id.clone(),
                    });
                }
                let regressed = st.departure < st.arrival
                    || previous.is_some_and(|p| {
                        p.sequence == st.sequence || st.arrival < p.departure
                    });
                if regressed {
                    return Err(FeedError::TimeRegression {
                        trip: trip.id.clone(),
                        sequence: st.sequence,
                    });
                }
                previous = Some(st);
            }
        }

        for transfer in &self.transfers {
            if transfer.kind == TransferKind::MinimumTime && transfer.min_transfer_secs.is_none() {
                return Err(FeedError::MissingTransferTime {
                    from: transfer.from_stop.clone(),
                    to: transfer.to_stop.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Builder for assembling feeds in code.
#[derive(Debug, Default)]
pub struct FeedBuilder {
    inner: Feed,
}

impl FeedBuilder {
    /// Add a stop.
    pub fn stop(mut self, id: &str, lat: f64, lon: f64) -> Self {
        self.inner.stops.insert(
            id.to_string(),
            Stop {
                id: id.to_string(),
                coord: Coord::new(lat, lon),
            },
        );
        self
    }

    /// Add a trip from `(stop, arrival, departure)` calls in visiting order.
    pub fn trip(mut self, id: &str, calls: &[(&str, Time, Time)]) -> Self {
        let stop_times = calls
            .iter()
            .enumerate()
            .map(|(i, (stop, arrival, departure))| StopTime {
                stop_id: (*stop).to_string(),
                sequence: i as u32,
                arrival: *arrival,
                departure: *departure,
            })
            .collect();
        self.inner
            .trips
            .insert(id.to_string(), Trip::new(id, stop_times));
        self
    }

    /// Add a declared transfer.
    pub fn transfer(mut self, from: &str, to: &str, kind: TransferKind, secs: Option<i64>) -> Self {
        self.inner.transfers.push(Transfer {
            from_stop: from.to_string(),
            to_stop: to.to_string(),
            kind,
            min_transfer_secs: secs,
        });
        self
    }

    pub fn build(self) -> Feed {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: i64, m: i64) -> Time {
        Time::hms(h, m, 0)
    }

    fn two_stop_feed() -> FeedBuilder {
        Feed::builder()
            .stop("A", 52.0, 13.0)
            .stop("B", 52.0, 13.01)
    }

    #[test]
    fn trip_orders_stop_times_by_sequence() {
        let trip = Trip::new(
            "T",
            vec![
                StopTime {
                    stop_id: "B".into(),
                    sequence: 5,
                    arrival: t(8, 10),
                    departure: t(8, 10),
                },
                StopTime {
                    stop_id: "A".into(),
                    sequence: 1,
                    arrival: t(8, 0),
                    departure: t(8, 0),
                },
            ],
        );
        let ids: Vec<_> = trip.stop_times().iter().map(|st| st.stop_id.as_str()).collect();
        assert_eq!(ids, ["A", "B"]);
    }

    #[test]
    fn transfer_kind_codes() {
        for code in 0..4 {
            let kind = TransferKind::from_code(code).unwrap();
            assert_eq!(kind.code(), code);
        }
        assert!(TransferKind::from_code(4).is_none());
    }

    #[test]
    fn valid_feed_passes() {
        let feed = two_stop_feed()
            .trip("T1", &[("A", t(8, 0), t(8, 0)), ("B", t(8, 5), t(8, 5))])
            .transfer("A", "B", TransferKind::Recommended, None)
            .build();
        assert!(feed.validate().is_ok());
    }

    #[test]
    fn unknown_stop_rejected() {
        let feed = two_stop_feed()
            .trip("T1", &[("A", t(8, 0), t(8, 0)), ("Z", t(8, 5), t(8, 5))])
            .build();
        assert_eq!(
            feed.validate(),
            Err(FeedError::UnknownStop {
                trip: "T1".into(),
                stop: "Z".into()
            })
        );
    }

    #[test]
    fn single_stop_trip_rejected() {
        let feed = two_stop_feed().trip("T1", &[("A", t(8, 0), t(8, 0))]).build();
        assert!(matches!(
            feed.validate(),
            Err(FeedError::TooFewStopTimes(_))
        ));
    }

    #[test]
    fn time_regression_rejected() {
        let feed = two_stop_feed()
            .trip("T1", &[("A", t(8, 10), t(8, 10)), ("B", t(8, 5), t(8, 5))])
            .build();
        assert!(matches!(
            feed.validate(),
            Err(FeedError::TimeRegression { sequence: 1, .. })
        ));

        let feed = two_stop_feed()
            .trip("T1", &[("A", t(8, 10), t(8, 9)), ("B", t(8, 15), t(8, 15))])
            .build();
        assert!(matches!(
            feed.validate(),
            Err(FeedError::TimeRegression { sequence: 0, .. })
        ));
    }

    #[test]
    fn minimum_time_transfer_needs_duration() {
        let feed = two_stop_feed()
            .transfer("A", "B", TransferKind::MinimumTime, None)
            .build();
        assert!(matches!(
            feed.validate(),
            Err(FeedError::MissingTransferTime { .. })
        ));
    }
}
