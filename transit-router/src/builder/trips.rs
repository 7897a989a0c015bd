//! Materializing scheduled trips as graph nodes and edges.

use crate::domain::{Coord, FeedId, NodeId, Time, TripIdx};
use crate::graph::{EdgeKind, Graph, NodeKind, ScheduledStop, Timetable};
use crate::network::InconsistentNetwork;

/// One call of a trip: station node, arrival and departure.
pub type Call = (NodeId, Time, Time);

/// Add a trip's nodes and edges and register it in the timetable.
///
/// Every call gets an arrival and a departure node. The trip is boarded
/// from the station into a departure node, rides from each departure node
/// to the next call's arrival node, dwells from arrival to departure at
/// intermediate calls, and is left from an arrival node to the station.
/// Calls must be in stop-sequence order. A call at a node the graph does
/// not have is an error, and nothing is added.
pub fn materialize_trip(
    graph: &mut Graph,
    timetable: &mut Timetable,
    feed: &FeedId,
    trip_id: &str,
    calls: &[Call],
) -> Result<TripIdx, InconsistentNetwork> {
    let coords = calls
        .iter()
        .map(|&(station, _, _)| {
            graph.node(station).map(|n| n.coord).ok_or_else(|| {
                InconsistentNetwork(format!("trip {trip_id} calls at missing node {station:?}"))
            })
        })
        .collect::<Result<Vec<Coord>, _>>()?;

    let trip = timetable.next_index();
    let last = calls.len().saturating_sub(1);

    let mut stops = Vec::with_capacity(calls.len());
    for (i, (&(station, arrival, departure), coord)) in calls.iter().zip(coords).enumerate() {
        let position = i as u32;
        let arrival_node = graph.add_node(coord, NodeKind::TripArrival { trip, position });
        let departure_node = graph.add_node(coord, NodeKind::TripDeparture { trip, position });

        if i < last {
            graph.add_edge(station, departure_node, EdgeKind::Board { trip, position });
        }
        if i > 0 {
            graph.add_edge(arrival_node, station, EdgeKind::Alight { trip, position });
        }
        if i > 0 && i < last {
            graph.add_edge(arrival_node, departure_node, EdgeKind::Dwell { trip, position });
        }

        stops.push(ScheduledStop {
            station,
            arrival,
            departure,
            arrival_node,
            departure_node,
        });
    }

    for (position, pair) in stops.windows(2).enumerate() {
        graph.add_edge(
            pair[0].departure_node,
            pair[1].arrival_node,
            EdgeKind::Ride {
                trip,
                position: position as u32,
            },
        );
    }

    Ok(timetable.add_trip(feed.clone(), trip_id.to_string(), stops))
}
