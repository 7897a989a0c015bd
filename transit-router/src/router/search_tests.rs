//! Scenario tests for the label-setting router.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use chrono::Utc;

use super::*;
use crate::builder::materialize_trip;
use crate::domain::{Coord, FeedId, NodeId, StopKey, Time};
use crate::graph::{EdgeKind, Graph, NodeKind, Timetable};
use crate::index;
use crate::network::Network;

fn t(h: i64, m: i64) -> Time {
    Time::hms(h, m, 0)
}

/// Hand-assembled network: a short street, named stations and trips.
struct Fixture {
    graph: Graph,
    timetable: Timetable,
    stations: BTreeMap<&'static str, NodeId>,
    streets: Vec<NodeId>,
}

impl Fixture {
    /// Three street nodes 100 m apart.
    fn new() -> Self {
        let mut graph = Graph::new();
        let streets: Vec<NodeId> = (0..3)
            .map(|i| graph.add_node(Coord::new(52.0, 0.00146 * i as f64), NodeKind::Street))
            .collect();
        graph.add_street(streets[0], streets[1], 100.0);
        graph.add_street(streets[1], streets[2], 100.0);
        Self {
            graph,
            timetable: Timetable::new(),
            stations: BTreeMap::new(),
            streets,
        }
    }

    /// Add a station, linked to street node `street` if given.
    fn station(mut self, id: &'static str, street: Option<usize>) -> Self {
        let stop = StopKey::new(FeedId::numbered(0), id);
        let coord = street
            .and_then(|s| self.graph.node(self.streets[s]))
            .map(|n| n.coord)
            .unwrap_or(Coord::new(52.1, 0.0));
        let node = self.graph.add_node(coord, NodeKind::Station { stop });
        if let Some(s) = street {
            let street = self.streets[s];
            self.graph.add_edge(street, node, EdgeKind::Access { secs: 0 });
            self.graph.add_edge(node, street, EdgeKind::Egress { secs: 0 });
        }
        self.stations.insert(id, node);
        self
    }

    /// Add a trip calling at `(station, arrival, departure)`.
    fn trip(mut self, id: &str, calls: &[(&str, Time, Time)]) -> Self {
        let calls: Vec<_> = calls
            .iter()
            .map(|(s, arr, dep)| (self.stations[*s], *arr, *dep))
            .collect();
        materialize_trip(
            &mut self.graph,
            &mut self.timetable,
            &FeedId::numbered(0),
            id,
            &calls,
        )
        .unwrap();
        self
    }

    fn transfer(mut self, from: &str, to: &str, secs: i64) -> Self {
        let (from, to) = (self.stations[from], self.stations[to]);
        self.graph.add_edge(from, to, EdgeKind::Transfer { secs });
        self
    }

    fn build(self) -> (Network, BTreeMap<&'static str, NodeId>, Vec<NodeId>) {
        let index = index::complete(&self.graph);
        let network = Network::new(self.graph, self.timetable, Vec::new(), index, Utc::now());
        (network, self.stations, self.streets)
    }
}

/// P -> R direct in an hour, or P -> Q -> R with a change in half an hour.
/// Only P is on the street.
fn tradeoff() -> (Network, BTreeMap<&'static str, NodeId>, Vec<NodeId>) {
    Fixture::new()
        .station("P", Some(0))
        .station("Q", None)
        .station("R", None)
        .trip("D", &[("P", t(8, 0), t(8, 0)), ("R", t(9, 0), t(9, 0))])
        .trip("F1", &[("P", t(8, 0), t(8, 0)), ("Q", t(8, 10), t(8, 10))])
        .trip("F2", &[("Q", t(8, 15), t(8, 15)), ("R", t(8, 30), t(8, 30))])
        .build()
}

fn trip_ids(itinerary: &Itinerary) -> Vec<String> {
    itinerary
        .legs
        .iter()
        .filter_map(|leg| match leg {
            Leg::Transit { trip_id, .. } => Some(trip_id.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn source_equals_target_yields_seed_only() {
    let (network, stations, _) = tradeoff();
    let p = stations["P"];

    let response = route(&network, &RouteRequest::new(p, t(8, 0)).to(p)).unwrap();

    assert_eq!(response.itineraries.len(), 1);
    let itinerary = &response.itineraries[0];
    assert!(itinerary.legs.is_empty());
    assert_eq!(itinerary.duration_secs(), 0);
    assert_eq!(itinerary.transfers, 0);
    assert_eq!(response.stats.iterations, 1);
    assert_eq!(response.stats.pushed, 1);
}

#[test]
fn pareto_front_trades_time_against_transfers() {
    let (network, stations, _) = tradeoff();
    let request = RouteRequest::new(stations["P"], t(7, 55)).to(stations["R"]);

    let response = route(&network, &request).unwrap();

    assert_eq!(response.itineraries.len(), 2);
    let fast = &response.itineraries[0];
    let direct = &response.itineraries[1];
    assert_eq!(fast.arrival, t(8, 30));
    assert_eq!(fast.transfers, 1);
    assert_eq!(trip_ids(fast), vec!["F1", "F2"]);
    assert_eq!(direct.arrival, t(9, 0));
    assert_eq!(direct.transfers, 0);
    assert_eq!(trip_ids(direct), vec!["D"]);
}

#[test]
fn later_departure_that_overtakes_is_found() {
    let (network, stations, _) = Fixture::new()
        .station("P", Some(0))
        .station("R", None)
        .trip("SLOW", &[("P", t(8, 0), t(8, 0)), ("R", t(9, 0), t(9, 0))])
        .trip("FAST", &[("P", t(8, 5), t(8, 5)), ("R", t(8, 30), t(8, 30))])
        .build();

    let request = RouteRequest::new(stations["P"], t(7, 55)).to(stations["R"]);
    let response = route(&network, &request).unwrap();

    assert_eq!(response.itineraries.len(), 1);
    assert_eq!(response.itineraries[0].arrival, t(8, 30));
    assert_eq!(trip_ids(&response.itineraries[0]), vec!["FAST"]);
}

#[test]
fn arrive_by_finds_overtaking_trip_leaving_later() {
    let (network, stations, _) = Fixture::new()
        .station("P", Some(0))
        .station("R", None)
        .trip("EARLY", &[("P", t(8, 20), t(8, 20)), ("R", t(8, 50), t(8, 50))])
        .trip("LATE", &[("P", t(8, 30), t(8, 30)), ("R", t(8, 40), t(8, 40))])
        .build();

    let request = RouteRequest::new(stations["R"], t(9, 0))
        .to(stations["P"])
        .arrive_by();
    let response = route(&network, &request).unwrap();

    assert_eq!(response.itineraries.len(), 1);
    assert_eq!(response.itineraries[0].departure, t(8, 30));
    assert_eq!(trip_ids(&response.itineraries[0]), vec!["LATE"]);
}

#[test]
fn transfer_shorter_than_walk_is_not_used() {
    let (network, stations, _) = Fixture::new()
        .station("P", Some(0))
        .station("Q1", None)
        .station("Q2", None)
        .station("R", None)
        .trip("A", &[("P", t(8, 0), t(8, 0)), ("Q1", t(8, 10), t(8, 10))])
        .trip("B1", &[("Q2", t(8, 11), t(8, 11)), ("R", t(8, 20), t(8, 20))])
        .trip("B2", &[("Q2", t(8, 15), t(8, 15)), ("R", t(8, 30), t(8, 30))])
        .transfer("Q1", "Q2", 120)
        .build();

    let request = RouteRequest::new(stations["P"], t(7, 59)).to(stations["R"]);
    let response = route(&network, &request).unwrap();

    assert_eq!(response.itineraries.len(), 1);
    let itinerary = &response.itineraries[0];
    assert_eq!(itinerary.arrival, t(8, 30));
    assert_eq!(trip_ids(itinerary), vec!["A", "B2"]);
    assert!(
        itinerary
            .legs
            .iter()
            .any(|leg| matches!(leg, Leg::Transfer { departure, arrival, .. }
                if arrival.since(*departure) == 120))
    );
}

#[test]
fn disconnected_station_is_only_left_by_riding() {
    let (network, stations, streets) = Fixture::new()
        .station("X", Some(0))
        .station("Z", None)
        .trip("OUT", &[("Z", t(8, 0), t(8, 0)), ("X", t(8, 10), t(8, 10))])
        .build();
    let (x, z) = (stations["X"], stations["Z"]);

    // From Z the only way out is the trip, then walking from X.
    let response = route(&network, &RouteRequest::new(z, t(7, 55))).unwrap();
    let street_times: Vec<Time> = response
        .reachable
        .iter()
        .filter(|r| r.node == streets[2])
        .map(|r| r.time)
        .collect();
    assert_eq!(street_times.len(), 1);
    assert!(street_times[0] > t(8, 10));
    assert!(response.reachable.iter().any(|r| r.node == x && r.transfers() == 0));

    // Nothing walks into Z.
    let response = route(&network, &RouteRequest::new(streets[0], t(7, 0)).to(z)).unwrap();
    assert!(response.itineraries.is_empty());
}

#[test]
fn arrive_by_finds_latest_departure() {
    let (network, stations, _) = tradeoff();
    let request = RouteRequest::new(stations["R"], t(9, 0))
        .to(stations["P"])
        .arrive_by();

    let response = route(&network, &request).unwrap();

    // Both options leave at 08:00; the direct one needs fewer boardings.
    assert_eq!(response.itineraries.len(), 1);
    let itinerary = &response.itineraries[0];
    assert_eq!(itinerary.departure, t(8, 0));
    assert_eq!(itinerary.arrival, t(9, 0));
    assert_eq!(trip_ids(itinerary), vec!["D"]);
    assert!(matches!(
        &itinerary.legs[0],
        Leg::Transit { from, to, hops: 1, .. } if *from == stations["P"] && *to == stations["R"]
    ));
}

#[test]
fn arrive_by_before_every_arrival_finds_nothing() {
    let (network, stations, _) = tradeoff();
    let request = RouteRequest::new(stations["R"], t(8, 29))
        .to(stations["P"])
        .arrive_by();
    let response = route(&network, &request).unwrap();
    assert!(response.itineraries.is_empty());
}

#[test]
fn settled_times_never_decrease_along_paths() {
    let (network, stations, _) = tradeoff();
    let config = RouterConfig::default();
    let mut search = MultiCriteriaLabelSetting::new(
        &network.graph,
        &network.timetable,
        &config,
        Direction::Forward,
        stations["P"],
        t(7, 50),
    );

    let mut settled = Vec::new();
    while let Some(id) = search.next() {
        settled.push(id.unwrap());
    }
    assert!(settled.len() > 5);
    for id in settled {
        let label = search.label(id);
        if let Some(parent) = label.parent {
            assert!(search.label(parent).time <= label.time);
            assert!(search.label(parent).boardings <= label.boardings);
        }
    }
}

#[test]
fn settled_frontiers_hold_no_dominated_labels() {
    let (network, stations, _) = tradeoff();
    let response = route(&network, &RouteRequest::new(stations["P"], t(7, 50))).unwrap();
    let dominance = Dominance::default();

    let as_label = |r: &Reach| Label {
        time: r.time,
        boardings: r.boardings,
        walk_mm: r.walk_mm,
        node: r.node,
        parent: None,
        edge: None,
    };
    for a in &response.reachable {
        for b in &response.reachable {
            if a.node == b.node && a != b {
                assert!(!dominance.dominates(&as_label(a), &as_label(b)));
            }
        }
    }
}

#[test]
fn budget_limited_runs_are_prefixes() {
    let (network, stations, _) = tradeoff();
    let unlimited = route(&network, &RouteRequest::new(stations["P"], t(7, 50))).unwrap();
    let full = unlimited.reachable;

    for n in [1, 3, 7, full.len()] {
        let limited = route(
            &network,
            &RouteRequest::new(stations["P"], t(7, 50)).with_max_results(n),
        )
        .unwrap();
        assert_eq!(limited.reachable[..], full[..n.min(full.len())]);
    }

    let iterations = unlimited.stats.iterations;
    for n in [1, iterations / 2, iterations] {
        let limited = route(
            &network,
            &RouteRequest::new(stations["P"], t(7, 50)).with_max_iterations(n),
        )
        .unwrap();
        assert!(limited.stats.iterations <= n);
        assert_eq!(limited.reachable[..], full[..limited.reachable.len()]);
    }
}

#[test]
fn horizon_drops_late_arrivals() {
    let (network, stations, _) = tradeoff();
    let request = RouteRequest::new(stations["P"], t(8, 0))
        .to(stations["R"])
        .with_max_duration(45 * 60);

    let response = route(&network, &request).unwrap();

    assert_eq!(response.itineraries.len(), 1);
    assert_eq!(response.itineraries[0].arrival, t(8, 30));
}

#[test]
fn cancelled_search_stops_immediately() {
    let (network, stations, _) = tradeoff();
    let flag = Arc::new(AtomicBool::new(true));
    let request = RouteRequest::new(stations["P"], t(8, 0))
        .to(stations["R"])
        .with_cancellation(Arc::clone(&flag));

    let response = route(&network, &request).unwrap();

    assert!(response.itineraries.is_empty());
    assert!(response.stats.cancelled);
    assert_eq!(response.stats.iterations, 0);
}

#[test]
fn walking_criterion_keeps_shorter_walks() {
    let (network, stations, streets) = Fixture::new()
        .station("P", Some(0))
        .build();
    let config = RouterConfig::default().with_criteria(Criteria {
        walk_distance: true,
    });
    let request = RouteRequest::new(streets[2], t(8, 0))
        .to(stations["P"])
        .with_config(config);

    let response = route(&network, &request).unwrap();

    assert_eq!(response.itineraries.len(), 1);
    assert!((response.itineraries[0].walk_m - 200.0).abs() < 1e-9);
}

#[test]
fn unknown_nodes_and_negative_budgets_are_rejected() {
    let (network, stations, _) = tradeoff();
    let ghost = NodeId(10_000);

    let err = route(&network, &RouteRequest::new(ghost, t(8, 0))).unwrap_err();
    assert_eq!(err, QueryError::UnknownNode(ghost));

    let err = route(&network, &RouteRequest::new(stations["P"], t(8, 0)).to(ghost)).unwrap_err();
    assert_eq!(err, QueryError::UnknownNode(ghost));

    let request = RouteRequest::new(stations["P"], t(8, 0)).with_max_duration(-1);
    assert_eq!(
        route(&network, &request).unwrap_err(),
        QueryError::NegativeBudget("max_duration")
    );
}
