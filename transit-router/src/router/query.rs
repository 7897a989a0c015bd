//! Route queries against a finished network.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tracing::debug;

use crate::domain::{NodeId, Time};
use crate::network::Network;

use super::config::{Criteria, Direction, RouterConfig};
use super::itinerary::Itinerary;
use super::search::{MultiCriteriaLabelSetting, SearchBudget, SearchError, SearchStats};

/// Error from a route query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("node {0:?} is not in the network")]
    UnknownNode(NodeId),

    #[error("{0} must not be negative")]
    NegativeBudget(&'static str),

    #[error("invalid route request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Search(#[from] SearchError),
}

/// A route query.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub source: NodeId,
    /// Departure time, or arrival deadline for backward queries.
    pub time: Time,
    pub target: Option<NodeId>,
    pub budget: SearchBudget,
    pub direction: Direction,
    pub config: RouterConfig,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl RouteRequest {
    /// Depart from `source` at `time`, exploring everything reachable.
    pub fn new(source: NodeId, time: Time) -> Self {
        Self {
            source,
            time,
            target: None,
            budget: SearchBudget::default(),
            direction: Direction::Forward,
            config: RouterConfig::default(),
            cancel: None,
        }
    }

    pub fn to(mut self, target: NodeId) -> Self {
        self.target = Some(target);
        self
    }

    /// Treat `time` as the latest arrival and search backwards.
    pub fn arrive_by(mut self) -> Self {
        self.direction = Direction::Backward;
        self
    }

    pub fn with_max_results(mut self, max: usize) -> Self {
        self.budget.max_results = Some(max);
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.budget.max_iterations = Some(max);
        self
    }

    pub fn with_max_duration(mut self, secs: i64) -> Self {
        self.budget.max_duration = Some(secs);
        self
    }

    pub fn with_criteria(mut self, criteria: Criteria) -> Self {
        self.config.criteria = criteria;
        self
    }

    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Validate the request against a network.
    pub fn validate(&self, network: &Network) -> Result<(), QueryError> {
        for node in std::iter::once(self.source).chain(self.target) {
            if !network.graph.contains_node(node) {
                return Err(QueryError::UnknownNode(node));
            }
        }
        if self.budget.max_duration.is_some_and(|d| d < 0) {
            return Err(QueryError::NegativeBudget("max_duration"));
        }
        if self.config.board_penalty_secs < 0 {
            return Err(QueryError::NegativeBudget("board_penalty_secs"));
        }
        if self.config.alight_penalty_secs < 0 {
            return Err(QueryError::NegativeBudget("alight_penalty_secs"));
        }
        if !(self.config.walk_speed_kmh > 0.0) {
            return Err(QueryError::InvalidRequest(
                "walk speed must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// A node reached by a query without a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reach {
    pub node: NodeId,
    pub time: Time,
    pub boardings: u32,
    pub walk_mm: u64,
}

impl Reach {
    pub fn transfers(&self) -> u32 {
        self.boardings.saturating_sub(1)
    }
}

/// Result of a route query.
#[derive(Debug, Clone, Default)]
pub struct RouteResponse {
    /// Pareto-optimal itineraries to the target, best time first.
    pub itineraries: Vec<Itinerary>,
    /// Every settled label, for queries without a target.
    pub reachable: Vec<Reach>,
    pub stats: SearchStats,
}

/// Run a route query.
pub fn route(network: &Network, request: &RouteRequest) -> Result<RouteResponse, QueryError> {
    request.validate(network)?;

    let mut search = MultiCriteriaLabelSetting::new(
        &network.graph,
        &network.timetable,
        &request.config,
        request.direction,
        request.source,
        request.time,
    )
    .with_budget(request.budget);
    if let Some(target) = request.target {
        search = search.with_target(target);
    }
    if let Some(flag) = &request.cancel {
        search = search.with_cancellation(Arc::clone(flag));
    }

    let mut response = RouteResponse::default();
    while let Some(id) = search.next() {
        let id = id?;
        if request.target.is_some() {
            let path = search.path(id);
            response.itineraries.push(Itinerary::from_path(
                &network.graph,
                &network.timetable,
                &path,
                request.direction,
            )?);
        } else {
            let label = search.label(id);
            response.reachable.push(Reach {
                node: label.node,
                time: label.time,
                boardings: label.boardings,
                walk_mm: label.walk_mm,
            });
        }
    }
    response.stats = search.stats();

    debug!(
        source = ?request.source,
        target = ?request.target,
        itineraries = response.itineraries.len(),
        reachable = response.reachable.len(),
        "route query answered"
    );
    Ok(response)
}
