//! Transfer resolution and transfer edges.
//!
//! Recommended transfers carry no duration. Each one is resolved by a
//! walk-only search from the origin station to the destination station;
//! the arrival time of the first label settled at the destination is the
//! duration. Searches only read the graph, so they run concurrently on the
//! blocking pool over a shared snapshot, and the results are committed
//! after every task has finished.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use crate::domain::{NodeId, StopKey, Time};
use crate::feed::TransferKind;
use crate::graph::{EdgeKind, Graph, Timetable};
use crate::network::ResolvedTransfer;
use crate::router::{Direction, MultiCriteriaLabelSetting, RouterConfig};

use super::error::BuildError;

/// A recommended transfer waiting for its duration.
#[derive(Debug, Clone)]
pub struct PendingTransfer {
    pub from: StopKey,
    pub to: StopKey,
    pub from_node: NodeId,
    pub to_node: NodeId,
}

/// Walking time in seconds from one station to another, starting at
/// midnight.
pub fn walk_duration(
    graph: &Graph,
    timetable: &Timetable,
    walk: &RouterConfig,
    transfer: &PendingTransfer,
) -> Result<i64, BuildError> {
    let mut search = MultiCriteriaLabelSetting::new(
        graph,
        timetable,
        walk,
        Direction::Forward,
        transfer.from_node,
        Time::ZERO,
    )
    .with_target(transfer.to_node);

    match search.next() {
        Some(Ok(id)) => Ok(search.label(id).time.since(Time::ZERO)),
        Some(Err(e)) => Err(e.into()),
        None => Err(BuildError::TransferUnreachable {
            from: transfer.from.clone(),
            to: transfer.to.clone(),
        }),
    }
}

/// Resolve every pending transfer, returning durations in input order.
///
/// Transfers are split into batches of `batch_size`, each resolved on the
/// blocking pool against the shared snapshot. The first failure, in input
/// order, fails the whole resolution.
pub async fn resolve(
    graph: Arc<Graph>,
    timetable: Arc<Timetable>,
    walk: RouterConfig,
    pending: Vec<PendingTransfer>,
    batch_size: usize,
) -> Result<Vec<i64>, BuildError> {
    let batches: Vec<Vec<PendingTransfer>> = pending
        .chunks(batch_size.max(1))
        .map(<[PendingTransfer]>::to_vec)
        .collect();
    debug!(transfers = pending.len(), batches = batches.len(), "Resolving transfers");

    let tasks = batches.into_iter().map(|batch| {
        let graph = Arc::clone(&graph);
        let timetable = Arc::clone(&timetable);
        let walk = walk.clone();
        tokio::task::spawn_blocking(move || {
            batch
                .iter()
                .map(|t| walk_duration(&graph, &timetable, &walk, t))
                .collect::<Result<Vec<i64>, BuildError>>()
        })
    });

    let mut durations = Vec::with_capacity(pending.len());
    for joined in join_all(tasks).await {
        durations.extend(joined??);
    }
    Ok(durations)
}

/// Zero-second transfers between stations snapped to the same street node.
///
/// Pairs already covered by an explicit transfer record are left out.
pub fn same_node_transfers(
    snapped: &BTreeMap<StopKey, (NodeId, Option<NodeId>)>,
    explicit: &BTreeSet<(StopKey, StopKey)>,
) -> Vec<ResolvedTransfer> {
    let mut by_street: BTreeMap<NodeId, Vec<&StopKey>> = BTreeMap::new();
    for (stop, (_, street)) in snapped {
        if let Some(street) = street {
            by_street.entry(*street).or_default().push(stop);
        }
    }

    let mut synthesized = Vec::new();
    for stops in by_street.values() {
        for &from in stops {
            for &to in stops {
                if from == to || explicit.contains(&(from.clone(), to.clone())) {
                    continue;
                }
                synthesized.push(ResolvedTransfer {
                    from: from.clone(),
                    to: to.clone(),
                    kind: TransferKind::MinimumTime,
                    secs: Some(0),
                });
            }
        }
    }
    synthesized
}

/// Add transfer edges for committed records.
///
/// Only minimum-time transfers become edges. Impossible and in-seat
/// transfers are recorded without one, as are transfers within a station.
pub fn add_transfer_edges(
    graph: &mut Graph,
    stations: &BTreeMap<StopKey, (NodeId, Option<NodeId>)>,
    transfers: &[ResolvedTransfer],
) -> Result<usize, BuildError> {
    let mut added = 0;
    for transfer in transfers {
        match transfer.kind {
            TransferKind::MinimumTime => {}
            TransferKind::Impossible | TransferKind::InSeat => continue,
            TransferKind::Recommended => {
                return Err(BuildError::UnresolvedTransfer {
                    from: transfer.from.clone(),
                    to: transfer.to.clone(),
                });
            }
        }
        let secs = transfer.secs.ok_or_else(|| BuildError::UnresolvedTransfer {
            from: transfer.from.clone(),
            to: transfer.to.clone(),
        })?;
        let station = |stop: &StopKey| {
            stations
                .get(stop)
                .map(|(node, _)| *node)
                .ok_or_else(|| BuildError::UnknownTransferStop {
                    feed: stop.feed.clone(),
                    stop: stop.stop_id.clone(),
                })
        };
        let (from, to) = (station(&transfer.from)?, station(&transfer.to)?);
        if from != to {
            graph.add_edge(from, to, EdgeKind::Transfer { secs });
            added += 1;
        }
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coord, FeedId};
    use crate::graph::NodeKind;

    fn key(id: &str) -> StopKey {
        StopKey::new(FeedId::numbered(0), id)
    }

    /// Station A - street 0 - 400 m - street 1 - station B.
    fn corridor() -> (Graph, NodeId, NodeId) {
        let mut g = Graph::new();
        let s0 = g.add_node(Coord::new(52.0, 0.0), NodeKind::Street);
        let s1 = g.add_node(Coord::new(52.0, 0.00584), NodeKind::Street);
        g.add_street(s0, s1, 400.0);
        let a = g.add_node(Coord::new(52.0, 0.0), NodeKind::Station { stop: key("A") });
        let b = g.add_node(Coord::new(52.0, 0.00584), NodeKind::Station { stop: key("B") });
        g.add_edge(s0, a, EdgeKind::Access { secs: 5 });
        g.add_edge(a, s0, EdgeKind::Egress { secs: 5 });
        g.add_edge(s1, b, EdgeKind::Access { secs: 5 });
        g.add_edge(b, s1, EdgeKind::Egress { secs: 5 });
        (g, a, b)
    }

    fn pending(a: NodeId, b: NodeId) -> PendingTransfer {
        PendingTransfer {
            from: key("A"),
            to: key("B"),
            from_node: a,
            to_node: b,
        }
    }

    #[test]
    fn walk_duration_adds_egress_street_and_access() {
        let (g, a, b) = corridor();
        let walk = RouterConfig::default().walk_only();
        let secs = walk_duration(&g, &Timetable::new(), &walk, &pending(a, b)).unwrap();
        assert_eq!(secs, 5 + walk.walk_secs(400_000) + 5);
    }

    #[test]
    fn unreachable_station_fails() {
        let (mut g, a, _) = corridor();
        let lonely = g.add_node(Coord::new(53.0, 0.0), NodeKind::Station { stop: key("C") });
        let walk = RouterConfig::default().walk_only();
        let result = walk_duration(&g, &Timetable::new(), &walk, &pending(a, lonely));
        assert!(matches!(result, Err(BuildError::TransferUnreachable { .. })));
    }

    #[tokio::test]
    async fn resolve_keeps_input_order_across_batches() {
        let (g, a, b) = corridor();
        let walk = RouterConfig::default().walk_only();
        let there = walk_duration(&g, &Timetable::new(), &walk, &pending(a, b)).unwrap();
        let jobs = vec![pending(a, b), pending(a, a), pending(b, a), pending(a, b)];

        let durations = resolve(Arc::new(g), Arc::new(Timetable::new()), walk, jobs, 3)
            .await
            .unwrap();
        assert_eq!(durations, vec![there, 0, there, there]);
    }

    #[test]
    fn same_node_pairs_skip_explicit_records() {
        let mut snapped = BTreeMap::new();
        snapped.insert(key("A"), (NodeId(10), Some(NodeId(1))));
        snapped.insert(key("B"), (NodeId(11), Some(NodeId(1))));
        snapped.insert(key("C"), (NodeId(12), Some(NodeId(2))));
        snapped.insert(key("D"), (NodeId(13), None));

        let explicit = BTreeSet::from([(key("A"), key("B"))]);
        let synthesized = same_node_transfers(&snapped, &explicit);

        assert_eq!(synthesized.len(), 1);
        assert_eq!(synthesized[0].from, key("B"));
        assert_eq!(synthesized[0].to, key("A"));
        assert_eq!(synthesized[0].secs, Some(0));
    }

    #[test]
    fn only_minimum_time_transfers_get_edges() {
        let (mut g, a, b) = corridor();
        let mut stations = BTreeMap::new();
        stations.insert(key("A"), (a, None));
        stations.insert(key("B"), (b, None));
        let record = |kind, secs| ResolvedTransfer {
            from: key("A"),
            to: key("B"),
            kind,
            secs,
        };
        let before = g.edge_count();

        let added = add_transfer_edges(
            &mut g,
            &stations,
            &[
                record(TransferKind::MinimumTime, Some(120)),
                record(TransferKind::Impossible, None),
                record(TransferKind::InSeat, None),
            ],
        )
        .unwrap();

        assert_eq!(added, 1);
        assert_eq!(g.edge_count(), before + 1);
        let result = add_transfer_edges(&mut g, &stations, &[record(TransferKind::Recommended, None)]);
        assert!(matches!(result, Err(BuildError::UnresolvedTransfer { .. })));
    }
}
