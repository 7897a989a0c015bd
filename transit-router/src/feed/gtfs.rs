//! Conversion from GTFS archives.
//!
//! Reading and parsing the archive is done by `gtfs-structures`; this module
//! only maps its object model onto [`Feed`].

use gtfs_structures::{Gtfs, TransferType};
use tracing::debug;

use crate::domain::{Coord, Time};

use super::{Feed, FeedError, Stop, StopTime, Transfer, TransferKind, Trip};

/// Read a GTFS archive (zip file or directory) into a feed.
pub fn read(path: &str) -> Result<Feed, FeedError> {
    let gtfs = Gtfs::new(path).map_err(|e| FeedError::Read(e.to_string()))?;
    from_gtfs(&gtfs)
}

/// Convert a parsed GTFS archive.
///
/// Stops without coordinates (generic nodes, boarding areas) are dropped;
/// trips calling at them then fail validation as referencing an unknown
/// stop.
pub fn from_gtfs(gtfs: &Gtfs) -> Result<Feed, FeedError> {
    let mut feed = Feed::new();

    for (stop_id, stop) in &gtfs.stops {
        let (Some(lat), Some(lon)) = (stop.latitude, stop.longitude) else {
            debug!(stop = %stop_id, "Skipping stop without coordinates");
            continue;
        };
        feed.stops.insert(
            stop_id.clone(),
            Stop {
                id: stop_id.clone(),
                coord: Coord::new(lat, lon),
            },
        );

        for transfer in &stop.transfers {
            let mut min_transfer_secs = transfer.min_transfer_time.map(i64::from);
            if matches!(transfer.transfer_type, TransferType::Timed) {
                min_transfer_secs = min_transfer_secs.or(Some(0));
            }
            feed.transfers.push(Transfer {
                from_stop: stop_id.clone(),
                to_stop: transfer.to_stop_id.clone(),
                kind: transfer_kind(&transfer.transfer_type),
                min_transfer_secs,
            });
        }
    }

    for (trip_id, trip) in &gtfs.trips {
        let mut stop_times = Vec::with_capacity(trip.stop_times.len());
        for st in &trip.stop_times {
            let sequence = u32::from(st.stop_sequence);
            let (arrival, departure) = match (st.arrival_time, st.departure_time) {
                (Some(a), Some(d)) => (a, d),
                (Some(a), None) => (a, a),
                (None, Some(d)) => (d, d),
                (None, None) => {
                    return Err(FeedError::MissingTime {
                        trip: trip_id.clone(),
                        sequence,
                    });
                }
            };
            stop_times.push(StopTime {
                stop_id: st.stop.id.clone(),
                sequence,
                arrival: Time::from_secs(i64::from(arrival)),
                departure: Time::from_secs(i64::from(departure)),
            });
        }
        feed.trips
            .insert(trip_id.clone(), Trip::new(trip_id.clone(), stop_times));
    }

    // HashMap iteration order is arbitrary; keep transfers deterministic.
    feed.transfers.sort_by(|a, b| {
        (&a.from_stop, &a.to_stop, a.kind.code(), a.min_transfer_secs).cmp(&(
            &b.from_stop,
            &b.to_stop,
            b.kind.code(),
            b.min_transfer_secs,
        ))
    });

    Ok(feed)
}

/// Map GTFS transfer types onto transfer kinds.
///
/// Timed transfers are treated as zero-minute minimum-time transfers since
/// the connecting vehicle is held; in-seat variants keep the passenger on
/// board and never become station transfers.
#[allow(unreachable_patterns)]
fn transfer_kind(transfer_type: &TransferType) -> TransferKind {
    match transfer_type {
        TransferType::Recommended => TransferKind::Recommended,
        TransferType::Timed => TransferKind::MinimumTime,
        TransferType::MinTime => TransferKind::MinimumTime,
        TransferType::Impossible => TransferKind::Impossible,
        _ => TransferKind::InSeat,
    }
}
