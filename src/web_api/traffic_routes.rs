//! Traffic management routes

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

use crate::error::Error;
use crate::models::{RequestContext, REQUEST_ID_HEADER};
use crate::state::AppState;
use crate::traffic_service::{FilterRequest, TrafficQuery};

/// Header carrying the traffic API token
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Create traffic router (without the token guard)
pub fn traffic_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/traffic", get(handle_retrieve))
        .route("/v1/traffic/:id", post(handle_delete))
        .route("/v1/traffic/counter/reset/:id", post(handle_counter_reset))
}

fn request_context(headers: &HeaderMap) -> RequestContext {
    RequestContext::from_header(headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()))
}

fn presented_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers.get(AUTH_TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(token.trim());
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Rejects requests without the configured token
pub async fn require_token(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Some(expected) = state.config.traffic_api_token.as_deref() {
        if presented_token(req.headers()) != Some(expected) {
            return Error::Unauthorized("Invalid or missing token".to_string()).into_response();
        }
    }
    next.run(req).await
}

async fn handle_retrieve(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TrafficQuery>,
) -> Response {
    let ctx = request_context(&headers);
    tracing::info!(request_id = %ctx.request_id, "Incoming request to traffic retrieve");

    let filter = match FilterRequest::parse(&query) {
        Ok(f) => f,
        Err(e) => return e.into_response(),
    };

    match state.traffic.retrieve_page(&ctx, &filter).await {
        Ok(page) => Json(page).into_response(),
        Err(_) => Error::Internal("Failed to retrieve traffics".to_string()).into_response(),
    }
}

async fn handle_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let ctx = request_context(&headers);

    match state.traffic.delete(&ctx, &id).await {
        Ok(()) => (StatusCode::ACCEPTED, Json(Value::Null)).into_response(),
        Err(e @ Error::InvalidArgument(_)) => e.into_response(),
        Err(_) => Error::Internal("Failed to delete traffic resource".to_string()).into_response(),
    }
}

async fn handle_counter_reset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let ctx = request_context(&headers);

    match state.traffic.reset_counter(&ctx, &id).await {
        Ok(()) => (StatusCode::ACCEPTED, Json(Value::Null)).into_response(),
        Err(e @ Error::InvalidArgument(_)) => e.into_response(),
        Err(_) => Error::Internal("Failed to reset traffic counter".to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_presented_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(presented_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"));
        assert_eq!(presented_token(&headers), Some("s3cret"));

        headers.insert(AUTH_TOKEN_HEADER, HeaderValue::from_static("other"));
        assert_eq!(presented_token(&headers), Some("other"));
    }
}
