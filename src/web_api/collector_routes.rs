//! Router report ingestion routes

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;

use crate::error::{Error, Result};
use crate::models::{RequestContext, REQUEST_ID_HEADER};
use crate::payload_decoder;
use crate::state::AppState;

/// Query parameter carrying the router payload
pub const ROUTER_QUERY_PARAM: &str = "router";

/// Create ingestion router
pub fn collector_routes() -> Router<AppState> {
    Router::new()
        .route("/v2/routers", get(handle_collector).post(handle_collector))
        .route("/v2/routers/", get(handle_collector).post(handle_collector))
        .route("/v2/routers/:str", get(handle_collector).post(handle_collector))
}

async fn handle_collector(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    path: Option<Path<String>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    state.metrics.inc_requests();

    let ctx = RequestContext::from_header(
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
    );
    tracing::info!(request_id = %ctx.request_id, "Incoming request to collector");

    let remote_addr = connect_info
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();
    let referer = headers.get(header::REFERER).and_then(|v| v.to_str().ok());
    let path_param = path.as_ref().map(|Path(p)| p.as_str());

    let result = collect(
        &state,
        &ctx,
        params.get(ROUTER_QUERY_PARAM).map(String::as_str),
        path_param,
        referer,
        &remote_addr,
    )
    .await;

    let mut response = match result {
        Ok(()) => (StatusCode::OK, Json(Value::Null)).into_response(),
        Err(e) => e.into_response(),
    };
    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

async fn collect(
    state: &AppState,
    ctx: &RequestContext,
    raw_query: Option<&str>,
    path_param: Option<&str>,
    referer: Option<&str>,
    remote_addr: &str,
) -> Result<()> {
    let request = payload_decoder::decode(raw_query, path_param, referer, remote_addr)?;

    tokio::time::timeout(
        state.config.request_timeout,
        state.collector.collect(ctx, &request),
    )
    .await
    .map_err(|_| {
        tracing::error!(request_id = %ctx.request_id, imei = request.imei_or_empty(), "Ingestion deadline exceeded");
        Error::Timeout("request deadline exceeded".to_string())
    })?
}
