//! Multi-criteria journey router.
//!
//! A label-setting search over the combined street and transit graph,
//! producing journeys that trade off arrival time against the number of
//! transfers and, optionally, walked distance. The same router resolves
//! walking transfers at build time with a walk-only edge allowlist.

pub mod config;
mod explorer;
mod itinerary;
mod label;
mod pareto;
mod query;
mod search;

#[cfg(test)]
mod search_tests;

pub use config::{Criteria, Direction, EdgeAllowlist, RouterConfig};
pub use explorer::GraphExplorer;
pub use itinerary::{Itinerary, Leg};
pub use label::{Dominance, Label, LabelArena, LabelId};
pub use pareto::{Insertion, ParetoStore};
pub use query::{QueryError, Reach, RouteRequest, RouteResponse, route};
pub use search::{MultiCriteriaLabelSetting, SearchBudget, SearchError, SearchStats};
