//! Domain types shared by the graph, the network builder and the router.
//!
//! Identifiers and times are small `Copy` newtypes that validate at
//! construction, so downstream code can trust them.

mod coord;
mod feed_id;
mod ids;
mod time;

pub use coord::Coord;
pub use feed_id::{FeedId, InvalidFeedId, StopKey};
pub use ids::{EdgeId, NodeId, PatternId, TripIdx};
pub use time::{Time, TimeError};
