//! Legacy record definitions
//!
//! Column names follow the legacy schema (`id_router`, `lat`, `lng`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `routers` row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RouterRecord {
    pub id: i64,
    pub imei: String,
    #[sqlx(rename = "lat")]
    pub latitude: Option<String>,
    #[sqlx(rename = "lng")]
    pub longitude: Option<String>,
}

/// `units` row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UnitRecord {
    pub id: i64,
    #[sqlx(rename = "id_router")]
    pub router_id: i64,
    #[sqlx(rename = "vehicle")]
    pub is_vehicle: bool,
}

/// `alarms` row (only the columns the collector reads)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlarmRecord {
    pub id: i64,
    #[sqlx(rename = "id_router")]
    pub router_id: i64,
    pub waiting: i32,
    pub attending: i32,
    #[sqlx(rename = "created")]
    pub created_at: DateTime<Utc>,
}

/// New `locations` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLocation {
    /// Open alarm id, 0 when the router has none
    pub alarm_id: i64,
    pub latitude: String,
    pub longitude: String,
    /// Only set when the location belongs to an open alarm
    pub updated_at: Option<DateTime<Utc>>,
}

/// `facility_locations` row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityLocation {
    pub unit_id: i64,
    pub location_id: i64,
}
