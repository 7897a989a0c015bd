//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::NodeId;
use crate::graph::NodeKind;
use crate::network::Network;
use crate::router::{Itinerary, Leg};

/// Query string of `GET /route`.
#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    pub from_lat: f64,
    pub from_lon: f64,
    pub to_lat: f64,
    pub to_lon: f64,

    /// Departure time, or arrival deadline with `arrive_by`, as HH:MM[:SS]
    pub time: String,

    /// Maximum number of itineraries
    pub max_results: Option<usize>,

    /// Treat `time` as the latest arrival
    #[serde(default)]
    pub arrive_by: bool,
}

/// Response of `GET /route`.
#[derive(Debug, Serialize)]
pub struct RouteResult {
    /// Node the origin coordinate snapped to
    pub from: String,

    /// Node the destination coordinate snapped to
    pub to: String,

    pub itineraries: Vec<ItineraryResult>,
}

/// One itinerary.
#[derive(Debug, Serialize)]
pub struct ItineraryResult {
    pub departure: String,
    pub arrival: String,
    pub duration_secs: i64,
    pub transfers: u32,
    pub walk_m: f64,
    pub legs: Vec<LegResult>,
}

/// One leg of an itinerary.
#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LegResult {
    Walk {
        from: String,
        to: String,
        departure: String,
        arrival: String,
        distance_m: f64,
    },
    Transit {
        feed: String,
        trip: String,
        from: String,
        to: String,
        departure: String,
        arrival: String,
        hops: u32,
    },
    Transfer {
        from: String,
        to: String,
        departure: String,
        arrival: String,
    },
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Human-readable name of a node: the stop key for stations, the node id
/// otherwise.
pub fn node_name(network: &Network, node: NodeId) -> String {
    match network.graph.node(node).map(|n| &n.kind) {
        Some(NodeKind::Station { stop }) => stop.to_string(),
        _ => format!("{node:?}"),
    }
}

impl ItineraryResult {
    pub fn from_itinerary(network: &Network, itinerary: &Itinerary) -> Self {
        let name = |node| node_name(network, node);
        let legs = itinerary
            .legs
            .iter()
            .map(|leg| match leg {
                Leg::Walk {
                    from,
                    to,
                    departure,
                    arrival,
                    distance_m,
                } => LegResult::Walk {
                    from: name(*from),
                    to: name(*to),
                    departure: departure.to_string(),
                    arrival: arrival.to_string(),
                    distance_m: *distance_m,
                },
                Leg::Transit {
                    feed,
                    trip_id,
                    from,
                    to,
                    departure,
                    arrival,
                    hops,
                } => LegResult::Transit {
                    feed: feed.to_string(),
                    trip: trip_id.clone(),
                    from: name(*from),
                    to: name(*to),
                    departure: departure.to_string(),
                    arrival: arrival.to_string(),
                    hops: *hops,
                },
                Leg::Transfer {
                    from,
                    to,
                    departure,
                    arrival,
                } => LegResult::Transfer {
                    from: name(*from),
                    to: name(*to),
                    departure: departure.to_string(),
                    arrival: arrival.to_string(),
                },
            })
            .collect();

        Self {
            departure: itinerary.departure.to_string(),
            arrival: itinerary.arrival.to_string(),
            duration_secs: itinerary.duration_secs(),
            transfers: itinerary.transfers,
            walk_m: itinerary.walk_m,
            legs,
        }
    }
}
