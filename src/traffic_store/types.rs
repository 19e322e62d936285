//! Traffic store type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the `traffic` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrafficModel {
    pub id: String,
    pub request: String,
    pub imei: String,
    pub ip: String,
    pub is_alarm: bool,
    pub is_notified: bool,
    pub counter: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrafficModel {
    /// Fresh record for a first sighting of (imei, is_alarm)
    pub fn new(imei: &str, request: &str, ip: &str, is_alarm: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            request: request.to_string(),
            imei: imei.to_string(),
            ip: ip.to_string(),
            is_alarm,
            is_notified: false,
            counter: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Sortable traffic columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    Id,
    Request,
    Imei,
    Ip,
    IsAlarm,
    Counter,
    CreatedAt,
    #[default]
    UpdatedAt,
}

impl SortColumn {
    /// Column name in SQL
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Request => "request",
            Self::Imei => "imei",
            Self::Ip => "ip",
            Self::IsAlarm => "is_alarm",
            Self::Counter => "counter",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    /// Parse the API `sortBy` value, unknown names fall back to `updated_at`
    pub fn parse(s: &str) -> Self {
        match s {
            "id" => Self::Id,
            "request" => Self::Request,
            "imei" => Self::Imei,
            "ip" => Self::Ip,
            "alarm" | "isAlarm" => Self::IsAlarm,
            "counter" => Self::Counter,
            "createdAt" | "created_at" => Self::CreatedAt,
            _ => Self::UpdatedAt,
        }
    }
}

/// Store-level filter for listing traffic
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrafficFilter {
    /// Free-text search over id/request/imei/ip
    pub q: Option<String>,
    pub id: Option<String>,
    pub request: Option<String>,
    pub imei: Option<String>,
    pub ip: Option<String>,
    pub is_alarm: Option<bool>,
    /// 0 means `counter = 0`, anything else means `counter > n`
    pub counter: Option<i32>,
    pub sort_by: SortColumn,
    pub sort_desc: bool,
    pub limit: i64,
    pub offset: i64,
}
