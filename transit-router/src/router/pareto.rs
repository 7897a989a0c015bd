//! Per-node Pareto frontiers.

use std::collections::HashMap;

use crate::domain::NodeId;

use super::label::{Dominance, Label, LabelArena, LabelId};

/// Outcome of offering a label to a frontier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Insertion {
    /// Whether the label joined the frontier.
    pub accepted: bool,
    /// Incumbents the label dominated, now removed.
    pub superseded: Vec<LabelId>,
}

/// Frontiers of non-dominated labels, one per node.
///
/// A label equal to an incumbent in every criterion is rejected, so a
/// frontier never holds two labels with the same criteria.
#[derive(Debug, Default)]
pub struct ParetoStore {
    dominance: Dominance,
    frontiers: HashMap<NodeId, Vec<LabelId>>,
}

impl ParetoStore {
    pub fn new(dominance: Dominance) -> Self {
        Self {
            dominance,
            frontiers: HashMap::new(),
        }
    }

    /// Offer the label `id` to the frontier of its node.
    pub fn try_insert(&mut self, arena: &LabelArena, id: LabelId) -> Insertion {
        let label = arena.get(id);
        let frontier = self.frontiers.entry(label.node).or_default();

        if frontier
            .iter()
            .any(|&other| self.dominance.covers(arena.get(other), label))
        {
            return Insertion::default();
        }

        let mut superseded = Vec::new();
        frontier.retain(|&other| {
            let dominated = self.dominance.dominates(label, arena.get(other));
            if dominated {
                superseded.push(other);
            }
            !dominated
        });
        frontier.push(id);

        Insertion {
            accepted: true,
            superseded,
        }
    }

    /// Whether some incumbent at the label's node is at least as good.
    pub fn is_dominated(&self, arena: &LabelArena, label: &Label) -> bool {
        self.is_dominated_at(arena, label.node, label)
    }

    /// Whether some incumbent at `node` is at least as good as `label`,
    /// whatever node the label itself is at.
    pub fn is_dominated_at(&self, arena: &LabelArena, node: NodeId, label: &Label) -> bool {
        self.frontier(node)
            .iter()
            .any(|&other| self.dominance.covers(arena.get(other), label))
    }

    pub fn frontier(&self, node: NodeId) -> &[LabelId] {
        self.frontiers.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of labels over all frontiers.
    pub fn len(&self) -> usize {
        self.frontiers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.frontiers.values().all(Vec::is_empty)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::Time;
    use crate::router::config::{Criteria, Direction};
    use proptest::prelude::*;

    fn labels_strategy() -> impl Strategy<Value = Vec<(i64, u32, u64)>> {
        prop::collection::vec((0i64..100, 0u32..5, 0u64..10), 0..30)
    }

    fn fill(labels: &[(i64, u32, u64)], walk: bool) -> (LabelArena, ParetoStore, Vec<LabelId>) {
        let mut arena = LabelArena::new();
        let mut store = ParetoStore::new(Dominance::new(
            Criteria {
                walk_distance: walk,
            },
            Direction::Forward,
        ));
        let ids: Vec<LabelId> = labels
            .iter()
            .map(|&(t, b, w)| {
                arena.push(Label {
                    time: Time::from_secs(t),
                    boardings: b,
                    walk_mm: w,
                    node: NodeId(0),
                    parent: None,
                    edge: None,
                })
            })
            .collect();
        for &id in &ids {
            store.try_insert(&arena, id);
        }
        (arena, store, ids)
    }

    proptest! {
        #[test]
        fn frontier_is_mutually_non_dominated(labels in labels_strategy(), walk in any::<bool>()) {
            let (arena, store, _) = fill(&labels, walk);
            let frontier = store.frontier(NodeId(0));
            for &a in frontier {
                for &b in frontier {
                    if a != b {
                        prop_assert!(!store.dominance.covers(arena.get(a), arena.get(b)));
                    }
                }
            }
        }

        #[test]
        fn every_offered_label_is_covered(labels in labels_strategy(), walk in any::<bool>()) {
            let (arena, store, ids) = fill(&labels, walk);
            for id in ids {
                prop_assert!(store.is_dominated(&arena, arena.get(id)));
            }
        }

        #[test]
        fn insertion_order_does_not_change_frontier_criteria(labels in labels_strategy()) {
            let (arena, store, _) = fill(&labels, true);
            let mut reversed = labels.clone();
            reversed.reverse();
            let (rev_arena, rev_store, _) = fill(&reversed, true);

            let key = |arena: &LabelArena, ids: &[LabelId]| {
                let mut keys: Vec<_> = ids
                    .iter()
                    .map(|&id| {
                        let l = arena.get(id);
                        (l.time, l.boardings, l.walk_mm)
                    })
                    .collect();
                keys.sort();
                keys
            };
            prop_assert_eq!(
                key(&arena, store.frontier(NodeId(0))),
                key(&rev_arena, rev_store.frontier(NodeId(0)))
            );
        }
    }
}
