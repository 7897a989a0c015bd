//! Labels: immutable partial-journey states, owned by one search.
//!
//! Labels live in an arena and point at their predecessor through a
//! [`LabelId`] handle. A label never refers to a successor, so the labels of
//! a search form a tree rooted at the seed.

use std::cmp::Ordering;
use std::fmt;

use crate::domain::{EdgeId, NodeId, Time};

use super::config::{Criteria, Direction};

/// Handle of a label within its search's arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelId(u32);

impl LabelId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}", self.0)
    }
}

/// A partial journey ending at `node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    /// Current time: arrival time forward, departure time backward.
    pub time: Time,
    /// Number of vehicles boarded so far.
    pub boardings: u32,
    /// Walked distance in millimetres.
    pub walk_mm: u64,
    pub node: NodeId,
    pub parent: Option<LabelId>,
    /// Edge used to reach `node` from the parent's node.
    pub edge: Option<EdgeId>,
}

impl Label {
    /// The seed label of a search.
    pub fn seed(node: NodeId, time: Time) -> Self {
        Self {
            time,
            boardings: 0,
            walk_mm: 0,
            node,
            parent: None,
            edge: None,
        }
    }

    /// Number of transfers: every boarding after the first.
    pub fn transfers(&self) -> u32 {
        self.boardings.saturating_sub(1)
    }

    /// Walked distance in metres.
    pub fn walk_distance_m(&self) -> f64 {
        self.walk_mm as f64 / 1000.0
    }
}

/// Append-only label storage.
#[derive(Debug, Default)]
pub struct LabelArena {
    labels: Vec<Label>,
}

impl LabelArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: Label) -> LabelId {
        let id = LabelId(self.labels.len() as u32);
        self.labels.push(label);
        id
    }

    /// Look up a label. Handles are only ever created by this arena.
    pub fn get(&self, id: LabelId) -> &Label {
        &self.labels[id.index()]
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Dominance relation between labels for one criteria configuration.
///
/// All criteria are integers, so comparisons are exact and the relation is
/// a strict partial order: irreflexive and transitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dominance {
    pub criteria: Criteria,
    pub direction: Direction,
}

impl Dominance {
    pub fn new(criteria: Criteria, direction: Direction) -> Self {
        Self {
            criteria,
            direction,
        }
    }

    /// Compare times so that `Less` means "better".
    fn time_order(&self, a: &Label, b: &Label) -> Ordering {
        match self.direction {
            Direction::Forward => a.time.cmp(&b.time),
            Direction::Backward => b.time.cmp(&a.time),
        }
    }

    fn orders(&self, a: &Label, b: &Label) -> [Ordering; 3] {
        let walk = if self.criteria.walk_distance {
            a.walk_mm.cmp(&b.walk_mm)
        } else {
            Ordering::Equal
        };
        [self.time_order(a, b), a.boardings.cmp(&b.boardings), walk]
    }

    /// `a` is at least as good as `b` in every criterion.
    pub fn covers(&self, a: &Label, b: &Label) -> bool {
        self.orders(a, b).iter().all(|o| *o != Ordering::Greater)
    }

    /// `a` dominates `b`: at least as good everywhere, strictly better
    /// somewhere.
    pub fn dominates(&self, a: &Label, b: &Label) -> bool {
        let orders = self.orders(a, b);
        orders.iter().all(|o| *o != Ordering::Greater) && orders.contains(&Ordering::Less)
    }

    /// Queue order: best time first, then fewer boardings, then less
    /// walking.
    pub fn queue_order(&self, a: &Label, b: &Label) -> Ordering {
        self.time_order(a, b)
            .then(a.boardings.cmp(&b.boardings))
            .then(a.walk_mm.cmp(&b.walk_mm))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn label_strategy() -> impl Strategy<Value = Label> {
        (0i64..50, 0u32..4, 0u64..5).prop_map(|(t, b, w)| Label {
            time: Time::from_secs(t),
            boardings: b,
            walk_mm: w,
            node: NodeId(0),
            parent: None,
            edge: None,
        })
    }

    fn dominance_strategy() -> impl Strategy<Value = Dominance> {
        (any::<bool>(), any::<bool>()).prop_map(|(walk, backward)| {
            Dominance::new(
                Criteria {
                    walk_distance: walk,
                },
                if backward {
                    Direction::Backward
                } else {
                    Direction::Forward
                },
            )
        })
    }

    proptest! {
        #[test]
        fn dominance_is_asymmetric(d in dominance_strategy(), a in label_strategy(), b in label_strategy()) {
            prop_assert!(!(d.dominates(&a, &b) && d.dominates(&b, &a)));
        }

        #[test]
        fn dominance_is_transitive(
            d in dominance_strategy(),
            a in label_strategy(),
            b in label_strategy(),
            c in label_strategy(),
        ) {
            if d.dominates(&a, &b) && d.dominates(&b, &c) {
                prop_assert!(d.dominates(&a, &c));
            }
        }

        #[test]
        fn dominating_label_sorts_first(d in dominance_strategy(), a in label_strategy(), b in label_strategy()) {
            if d.dominates(&a, &b) {
                prop_assert_eq!(d.queue_order(&a, &b), Ordering::Less);
            }
        }
    }
}
