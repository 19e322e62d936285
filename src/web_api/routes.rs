//! API Routes

use axum::{middleware, routing::get, Router};

use super::collector_routes::collector_routes;
use super::traffic_routes::{require_token, traffic_routes};
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & metrics
        .route("/health/live", get(super::health_live))
        .route("/health/ready", get(super::health_ready))
        .route("/metrics", get(super::metrics))
        // Ingestion (unauthenticated)
        .merge(collector_routes())
        // Traffic management
        .merge(
            traffic_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_token)),
        )
        .with_state(state)
}
