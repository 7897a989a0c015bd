//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tracing::{debug, warn};

use crate::domain::{Coord, Time, TimeError};
use crate::network::NetworkSummary;
use crate::router::{QueryError, RouteRequest, RouterConfig, route};

use super::dto::*;
use super::state::AppState;

/// Itineraries returned when the query does not ask for a number.
const DEFAULT_MAX_RESULTS: usize = 5;

/// Upper bound on requested itineraries.
const MAX_RESULTS_LIMIT: usize = 20;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/network", get(network_summary))
        .route("/route", get(plan_route))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Counts of the loaded network.
async fn network_summary(State(state): State<AppState>) -> Json<NetworkSummary> {
    Json(state.network.summary())
}

/// Plan journeys between two coordinates.
async fn plan_route(
    State(state): State<AppState>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<RouteResult>, AppError> {
    let time = Time::parse(&query.time)?;
    let network = &state.network;

    let snap = |lat: f64, lon: f64| {
        network.snap(Coord::new(lat, lon)).ok_or_else(|| AppError::NotFound {
            message: format!("no network node near {lat},{lon}"),
        })
    };
    let from = snap(query.from_lat, query.from_lon)?;
    let to = snap(query.to_lat, query.to_lon)?;

    let max_results = query
        .max_results
        .unwrap_or(DEFAULT_MAX_RESULTS)
        .clamp(1, MAX_RESULTS_LIMIT);
    let config: RouterConfig = (*state.router).clone();

    // An arrive-by search starts at the destination.
    let request = if query.arrive_by {
        RouteRequest::new(to, time).to(from).arrive_by()
    } else {
        RouteRequest::new(from, time).to(to)
    };
    let request = request.with_max_results(max_results).with_config(config);

    let response = route(network, &request)?;
    debug!(
        ?from,
        ?to,
        itineraries = response.itineraries.len(),
        iterations = response.stats.iterations,
        "Planned route"
    );

    Ok(Json(RouteResult {
        from: node_name(network, from),
        to: node_name(network, to),
        itineraries: response
            .itineraries
            .iter()
            .map(|i| ItineraryResult::from_itinerary(network, i))
            .collect(),
    }))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<TimeError> for AppError {
    fn from(e: TimeError) -> Self {
        AppError::BadRequest {
            message: format!("invalid time: {e}"),
        }
    }
}

impl From<QueryError> for AppError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::UnknownNode(_)
            | QueryError::NegativeBudget(_)
            | QueryError::InvalidRequest(_) => AppError::BadRequest {
                message: e.to_string(),
            },
            QueryError::Search(_) => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        warn!(%status, %message, "Request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
