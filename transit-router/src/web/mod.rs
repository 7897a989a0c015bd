//! HTTP surface of the router.
//!
//! Serves a read-only, already built network: a health check, a network
//! summary and journey queries between coordinates.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
