//! Shared models and types
//!
//! Types used by more than one module live here to avoid circular
//! dependencies.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header carrying the request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request-scoped values threaded through service calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: String,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }

    /// Use the caller's id when present, otherwise generate one
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(id) if !id.is_empty() => Self::new(id),
            _ => Self::new(Uuid::new_v4().to_string()),
        }
    }
}

/// Paginated listing envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub current_page: i64,
    pub pages: i64,
    pub total: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, current_page: i64, size: i64, total: i64) -> Self {
        let pages = if size > 0 { (total + size - 1) / size } else { 0 };
        Self {
            data,
            current_page,
            pages,
            total,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
