//! WebAPI - REST API Endpoints
//!
//! ## Responsibilities
//!
//! - Router report ingestion
//! - Traffic management (token guarded)
//! - Health and metrics

mod collector_routes;
mod routes;
mod traffic_routes;

pub use collector_routes::ROUTER_QUERY_PARAM;
pub use routes::create_router;
pub use traffic_routes::AUTH_TOKEN_HEADER;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::Result;
use crate::models::HealthResponse;
use crate::state::AppState;

/// Liveness check
pub async fn health_live() -> impl IntoResponse {
    Json(HealthResponse::ok())
}

/// Readiness check
pub async fn health_ready() -> impl IntoResponse {
    Json(HealthResponse::ok())
}

/// Prometheus metrics
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let body = state.metrics.render()?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}
