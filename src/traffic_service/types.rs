//! Traffic API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::traffic_store::{SortColumn, TrafficFilter, TrafficModel};

/// Default page size
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest accepted page size
pub const MAX_PAGE_SIZE: i64 = 100;

/// Smallest accepted page size; anything lower falls back to the default
pub const MIN_PAGE_SIZE: i64 = 1;

/// Largest accepted page; keeps `(page - 1) * size` inside `i64`
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

/// Raw query string of `GET /v1/traffic`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficQuery {
    pub q: Option<String>,
    pub id: Option<String>,
    pub request: Option<String>,
    pub imei: Option<String>,
    pub ip: Option<String>,
    pub alarm: Option<String>,
    pub counter: Option<String>,
    pub sort_by: Option<String>,
    pub sort_desc: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

/// Validated listing request
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRequest {
    pub q: Option<String>,
    pub id: Option<String>,
    pub request: Option<String>,
    pub imei: Option<String>,
    pub ip: Option<String>,
    pub is_alarm: Option<bool>,
    pub counter: Option<i32>,
    pub sort_by: SortColumn,
    pub sort_desc: bool,
    /// 1-based
    pub page: i64,
    pub size: i64,
}

impl Default for FilterRequest {
    fn default() -> Self {
        Self {
            q: None,
            id: None,
            request: None,
            imei: None,
            ip: None,
            is_alarm: None,
            counter: None,
            sort_by: SortColumn::default(),
            sort_desc: false,
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Boolean literals accepted on the query string
fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

impl FilterRequest {
    /// Validate the raw query. Bad `counter`/`alarm` values are rejected;
    /// paging values are sanitized instead.
    pub fn parse(query: &TrafficQuery) -> Result<Self> {
        let counter = match non_empty(&query.counter) {
            Some(raw) => Some(
                raw.parse::<i32>()
                    .map_err(|_| Error::InvalidArgument("Invalid counter parameter".to_string()))?,
            ),
            None => None,
        };

        let is_alarm = match non_empty(&query.alarm) {
            Some(raw) => Some(
                parse_bool(&raw)
                    .ok_or_else(|| Error::InvalidArgument("Invalid page parameter".to_string()))?,
            ),
            None => None,
        };

        let page = non_empty(&query.page)
            .and_then(|p| p.parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .map(|p| p.min(MAX_PAGE))
            .unwrap_or(1);

        let size = match non_empty(&query.size).and_then(|s| s.parse::<i64>().ok()) {
            Some(s) if s < MIN_PAGE_SIZE => DEFAULT_PAGE_SIZE,
            Some(s) => s.min(MAX_PAGE_SIZE),
            None => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            q: non_empty(&query.q),
            id: non_empty(&query.id),
            request: non_empty(&query.request),
            imei: non_empty(&query.imei),
            ip: non_empty(&query.ip),
            is_alarm,
            counter,
            sort_by: non_empty(&query.sort_by)
                .map(|s| SortColumn::parse(&s))
                .unwrap_or_default(),
            sort_desc: non_empty(&query.sort_desc)
                .and_then(|s| parse_bool(&s))
                .unwrap_or(false),
            page,
            size,
        })
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).max(0).saturating_mul(self.size)
    }

    /// Store filter for this request
    pub fn to_store_filter(&self) -> TrafficFilter {
        TrafficFilter {
            q: self.q.clone(),
            id: self.id.clone(),
            request: self.request.clone(),
            imei: self.imei.clone(),
            ip: self.ip.clone(),
            is_alarm: self.is_alarm,
            counter: self.counter,
            sort_by: self.sort_by,
            sort_desc: self.sort_desc,
            limit: self.size,
            offset: self.offset(),
        }
    }
}

/// Traffic item as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Traffic {
    pub id: String,
    pub request: String,
    pub imei: String,
    pub ip: String,
    pub alarm: bool,
    pub counter: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TrafficModel> for Traffic {
    fn from(model: TrafficModel) -> Self {
        Self {
            id: model.id,
            request: model.request,
            imei: model.imei,
            ip: model.ip,
            alarm: model.is_alarm,
            counter: model.counter,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
