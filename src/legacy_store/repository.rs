//! Legacy Repository - Router/unit/alarm/location tables of the legacy database

use async_trait::async_trait;
use chrono::Utc;
use sqlx::MySqlPool;
use tracing::debug;

use super::types::*;
use crate::error::{Error, Result};

#[async_trait]
pub trait RouterRepository: Send + Sync {
    /// Router by IMEI, `NotFound` when absent
    async fn find_by_imei(&self, imei: &str) -> Result<RouterRecord>;

    /// Overwrite the last known position
    async fn update_position(&self, router_id: i64, latitude: &str, longitude: &str) -> Result<()>;
}

#[async_trait]
pub trait UnitRepository: Send + Sync {
    /// Unit attached to a router, `NotFound` when absent
    async fn find_by_router_id(&self, router_id: i64) -> Result<UnitRecord>;
}

#[async_trait]
pub trait AlarmRepository: Send + Sync {
    /// Most recent open alarm of a router
    async fn find_open_by_router_id(&self, router_id: i64) -> Result<Option<AlarmRecord>>;
}

#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Insert a location, returning its generated id
    async fn create(&self, location: &NewLocation) -> Result<i64>;
}

#[async_trait]
pub trait FacilityLocationRepository: Send + Sync {
    async fn create(&self, link: &FacilityLocation) -> Result<()>;
}

/// MySQL implementation of every legacy table
#[derive(Clone)]
pub struct MySqlLegacyRepository {
    pool: MySqlPool,
}

impl MySqlLegacyRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RouterRepository for MySqlLegacyRepository {
    async fn find_by_imei(&self, imei: &str) -> Result<RouterRecord> {
        let row: Option<RouterRecord> =
            sqlx::query_as("SELECT id, imei, lat, lng FROM routers WHERE imei = ? LIMIT 1")
                .bind(imei)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| Error::Persistence(format!("Error while searching for router: {}", e)))?;

        row.ok_or_else(|| Error::NotFound("Router information not found".to_string()))
    }

    async fn update_position(&self, router_id: i64, latitude: &str, longitude: &str) -> Result<()> {
        sqlx::query("UPDATE routers SET lat = ?, lng = ?, updated = ? WHERE id = ?")
            .bind(latitude)
            .bind(longitude)
            .bind(Utc::now())
            .bind(router_id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;

        debug!(router_id, latitude, longitude, "Router position updated");
        Ok(())
    }
}

#[async_trait]
impl UnitRepository for MySqlLegacyRepository {
    async fn find_by_router_id(&self, router_id: i64) -> Result<UnitRecord> {
        let row: Option<UnitRecord> =
            sqlx::query_as("SELECT id, id_router, vehicle FROM units WHERE id_router = ? LIMIT 1")
                .bind(router_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| Error::Persistence(format!("Error while searching for unit: {}", e)))?;

        row.ok_or_else(|| Error::NotFound("Unit information not found".to_string()))
    }
}

#[async_trait]
impl AlarmRepository for MySqlLegacyRepository {
    async fn find_open_by_router_id(&self, router_id: i64) -> Result<Option<AlarmRecord>> {
        sqlx::query_as(
            r#"
            SELECT id, id_router, waiting, attending, created
            FROM alarms
            WHERE id_router = ? AND (waiting = 1 OR attending = 1)
            ORDER BY created DESC
            LIMIT 1
            "#,
        )
        .bind(router_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Persistence(format!("Error while searching for alarm: {}", e)))
    }
}

#[async_trait]
impl LocationRepository for MySqlLegacyRepository {
    async fn create(&self, location: &NewLocation) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO locations (id_alarm, lat, lng, date_update) VALUES (?, ?, ?, ?)",
        )
        .bind(location.alarm_id)
        .bind(&location.latitude)
        .bind(&location.longitude)
        .bind(location.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Persistence(e.to_string()))?;

        Ok(result.last_insert_id() as i64)
    }
}

#[async_trait]
impl FacilityLocationRepository for MySqlLegacyRepository {
    async fn create(&self, link: &FacilityLocation) -> Result<()> {
        sqlx::query("INSERT INTO facility_locations (id_unit, id_location) VALUES (?, ?)")
            .bind(link.unit_id)
            .bind(link.location_id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;
        Ok(())
    }
}
