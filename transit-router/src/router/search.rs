//! Multi-criteria label-setting search.
//!
//! Labels are settled in lexicographic (time, boardings, walk) order. All
//! edge costs are non-negative in the search direction, so a settled label
//! is never dominated by one settled later, and the sequence of settled
//! labels is deterministic for a given network and request.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, trace};

use crate::domain::{NodeId, Time};
use crate::graph::{Graph, Timetable};

use super::config::{Direction, RouterConfig};
use super::explorer::GraphExplorer;
use super::label::{Dominance, Label, LabelArena, LabelId};
use super::pareto::ParetoStore;

/// Error from a search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The network refers to a trip, stop or edge that does not exist.
    #[error("inconsistent network: {0}")]
    Inconsistent(String),
}

/// Limits that end a search early.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchBudget {
    /// Stop after this many results.
    pub max_results: Option<usize>,
    /// Stop after this many labels have been popped.
    pub max_iterations: Option<usize>,
    /// Discard labels more than this many seconds from the start time.
    pub max_duration: Option<i64>,
}

/// Counters describing a search run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub iterations: usize,
    pub settled: usize,
    pub pushed: usize,
    pub cancelled: bool,
}

type QueueKey = Reverse<(i64, u32, u64, LabelId)>;

/// A label-setting search from one source node and time.
///
/// Iterating yields settled labels: every settled label when there is no
/// target, otherwise only the labels settled at the target.
pub struct MultiCriteriaLabelSetting<'a> {
    explorer: GraphExplorer<'a>,
    dominance: Dominance,
    arena: LabelArena,
    settled: ParetoStore,
    heap: BinaryHeap<QueueKey>,
    successors: Vec<Label>,
    start: Time,
    target: Option<NodeId>,
    budget: SearchBudget,
    cancel: Option<Arc<AtomicBool>>,
    results: usize,
    stats: SearchStats,
    done: bool,
}

impl<'a> MultiCriteriaLabelSetting<'a> {
    pub fn new(
        graph: &'a Graph,
        timetable: &'a Timetable,
        config: &'a RouterConfig,
        direction: Direction,
        source: NodeId,
        time: Time,
    ) -> Self {
        let dominance = Dominance::new(config.criteria, direction);
        let mut search = Self {
            explorer: GraphExplorer::new(graph, timetable, config, direction),
            dominance,
            arena: LabelArena::new(),
            settled: ParetoStore::new(dominance),
            heap: BinaryHeap::new(),
            successors: Vec::new(),
            start: time,
            target: None,
            budget: SearchBudget::default(),
            cancel: None,
            results: 0,
            stats: SearchStats::default(),
            done: false,
        };
        let seed = search.arena.push(Label::seed(source, time));
        let key = search.queue_key(seed);
        search.heap.push(key);
        search.stats.pushed = 1;
        search
    }

    /// Stop expanding at `target` and only yield labels settled there.
    pub fn with_target(mut self, target: NodeId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    /// End the search as soon as `flag` is set.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn label(&self, id: LabelId) -> &Label {
        self.arena.get(id)
    }

    /// Labels from the seed to `id`, following parent handles.
    pub fn path(&self, id: LabelId) -> Vec<Label> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            let label = self.arena.get(id);
            path.push(*label);
            current = label.parent;
        }
        path.reverse();
        path
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    pub fn direction(&self) -> Direction {
        self.explorer.direction()
    }

    fn queue_key(&self, id: LabelId) -> QueueKey {
        let label = self.arena.get(id);
        let time = match self.dominance.direction {
            Direction::Forward => label.time.secs(),
            Direction::Backward => -label.time.secs(),
        };
        Reverse((time, label.boardings, label.walk_mm, id))
    }

    fn within_horizon(&self, label: &Label) -> bool {
        let Some(max) = self.budget.max_duration else {
            return true;
        };
        let elapsed = match self.dominance.direction {
            Direction::Forward => label.time.since(self.start),
            Direction::Backward => self.start.since(label.time),
        };
        elapsed <= max
    }

    /// Whether a settled label at the target is at least as good.
    fn beaten_at_target(&self, label: &Label) -> bool {
        self.target
            .is_some_and(|target| self.settled.is_dominated_at(&self.arena, target, label))
    }

    fn finish(&mut self) {
        self.done = true;
        debug!(
            iterations = self.stats.iterations,
            settled = self.stats.settled,
            pushed = self.stats.pushed,
            cancelled = self.stats.cancelled,
            "search finished"
        );
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

impl Iterator for MultiCriteriaLabelSetting<'_> {
    type Item = Result<LabelId, SearchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if self.cancelled() {
                self.stats.cancelled = true;
                self.finish();
                return None;
            }
            if self
                .budget
                .max_results
                .is_some_and(|max| self.results >= max)
                || self
                    .budget
                    .max_iterations
                    .is_some_and(|max| self.stats.iterations >= max)
            {
                self.finish();
                return None;
            }
            let Some(Reverse((_, _, _, id))) = self.heap.pop() else {
                self.finish();
                return None;
            };
            self.stats.iterations += 1;

            let label = *self.arena.get(id);
            let at_target = self.target == Some(label.node);
            if !at_target && self.beaten_at_target(&label) {
                continue;
            }
            if !self.settled.try_insert(&self.arena, id).accepted {
                continue;
            }
            self.stats.settled += 1;
            trace!(node = ?label.node, time = %label.time, boardings = label.boardings, "settled");

            if !at_target {
                self.successors.clear();
                if let Err(e) = self.explorer.expand(id, &label, &mut self.successors) {
                    self.finish();
                    return Some(Err(e));
                }
                let successors = std::mem::take(&mut self.successors);
                for next in &successors {
                    if !self.within_horizon(next)
                        || self.settled.is_dominated(&self.arena, next)
                        || self.beaten_at_target(next)
                    {
                        continue;
                    }
                    let next_id = self.arena.push(*next);
                    let key = self.queue_key(next_id);
                    self.heap.push(key);
                    self.stats.pushed += 1;
                }
                self.successors = successors;
            }

            if self.target.is_none() || at_target {
                self.results += 1;
                return Some(Ok(id));
            }
        }
    }
}
