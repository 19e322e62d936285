//! Traffic Repository - Database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use tracing::debug;

use super::types::{TrafficFilter, TrafficModel};
use crate::error::{Error, Result};

// MySQL `traffic` table with snake_case `is_alarm`/`is_notified` columns. Tables
// created with quoted `"isAlarm"` and lowercase `isnotified` must be migrated
// (rename both columns) before this repository can read them.
const SELECT_COLUMNS: &str =
    "SELECT id, request, imei, ip, is_alarm, is_notified, counter, created_at, updated_at FROM traffic";

/// Traffic persistence
#[async_trait]
pub trait TrafficRepository: Send + Sync {
    /// Insert a new traffic row
    async fn create(&self, model: &TrafficModel) -> Result<()>;

    /// Whether any row exists for (imei, is_alarm)
    async fn exists_by_imei(&self, imei: &str, is_alarm: bool) -> Result<bool>;

    /// Replace the request string, bump the counter and clear the notified flag
    async fn update_by_imei(&self, imei: &str, request: &str, is_alarm: bool) -> Result<()>;

    /// Filtered, sorted, paginated listing
    async fn retrieve(&self, filter: &TrafficFilter) -> Result<Vec<TrafficModel>>;

    /// Number of rows matching the filter (pagination ignored)
    async fn count(&self, filter: &TrafficFilter) -> Result<i64>;

    async fn delete_by_id(&self, id: &str) -> Result<()>;

    /// Set counter back to zero
    async fn reset_counter(&self, id: &str) -> Result<()>;
}

/// MySQL-backed traffic repository
#[derive(Clone)]
pub struct MySqlTrafficRepository {
    pool: MySqlPool,
}

impl MySqlTrafficRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrafficRepository for MySqlTrafficRepository {
    async fn create(&self, model: &TrafficModel) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO traffic
                (id, request, imei, ip, is_alarm, is_notified, counter, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&model.id)
        .bind(&model.request)
        .bind(&model.imei)
        .bind(&model.ip)
        .bind(model.is_alarm)
        .bind(model.is_notified)
        .bind(model.counter)
        .bind(model.created_at)
        .bind(model.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Persistence(e.to_string()))?;

        debug!(id = %model.id, imei = %model.imei, is_alarm = model.is_alarm, "Traffic created");
        Ok(())
    }

    async fn exists_by_imei(&self, imei: &str, is_alarm: bool) -> Result<bool> {
        let found: Option<String> = sqlx::query_scalar(
            "SELECT id FROM traffic WHERE imei = ? AND is_alarm = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(imei)
        .bind(is_alarm)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Persistence(e.to_string()))?;

        Ok(found.is_some())
    }

    async fn update_by_imei(&self, imei: &str, request: &str, is_alarm: bool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE traffic
            SET request = ?, updated_at = ?, counter = counter + 1, is_notified = FALSE
            WHERE imei = ? AND is_alarm = ?
            "#,
        )
        .bind(request)
        .bind(Utc::now())
        .bind(imei)
        .bind(is_alarm)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Persistence(e.to_string()))?;

        Ok(())
    }

    async fn retrieve(&self, filter: &TrafficFilter) -> Result<Vec<TrafficModel>> {
        let mut qb: QueryBuilder<MySql> = QueryBuilder::new(SELECT_COLUMNS);
        push_filters(&mut qb, filter);

        qb.push(" ORDER BY ")
            .push(filter.sort_by.as_sql())
            .push(if filter.sort_desc { " DESC" } else { " ASC" });
        if filter.limit > 0 {
            qb.push(" LIMIT ")
                .push_bind(filter.limit)
                .push(" OFFSET ")
                .push_bind(filter.offset.max(0));
        }

        qb.build_query_as::<TrafficModel>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Persistence(format!("Error retrieving traffics: {}", e)))
    }

    async fn count(&self, filter: &TrafficFilter) -> Result<i64> {
        let mut qb: QueryBuilder<MySql> = QueryBuilder::new("SELECT COUNT(*) FROM traffic");
        push_filters(&mut qb, filter);

        qb.build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Persistence(format!("Error counting traffics: {}", e)))
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM traffic WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Persistence(format!("Failed delete traffic: {}", e)))?;
        Ok(())
    }

    async fn reset_counter(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE traffic SET counter = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Persistence(format!("Failed reset traffic counter: {}", e)))?;
        Ok(())
    }
}

/// Append `WHERE` predicates for a traffic filter
fn push_filters(qb: &mut QueryBuilder<'_, MySql>, filter: &TrafficFilter) {
    qb.push(" WHERE 1 = 1");

    if let Some(q) = &filter.q {
        let pattern = format!("%{}%", q);
        qb.push(" AND (id LIKE ")
            .push_bind(pattern.clone())
            .push(" OR request LIKE ")
            .push_bind(pattern.clone())
            .push(" OR imei LIKE ")
            .push_bind(pattern.clone())
            .push(" OR ip LIKE ")
            .push_bind(pattern)
            .push(")");
    }

    let substring_columns = [
        ("id", &filter.id),
        ("request", &filter.request),
        ("imei", &filter.imei),
        ("ip", &filter.ip),
    ];
    for (column, value) in substring_columns {
        if let Some(v) = value {
            qb.push(" AND ")
                .push(column)
                .push(" LIKE ")
                .push_bind(format!("%{}%", v));
        }
    }

    if let Some(is_alarm) = filter.is_alarm {
        qb.push(" AND is_alarm = ").push_bind(is_alarm);
    }

    match filter.counter {
        Some(0) => {
            qb.push(" AND counter = 0");
        }
        Some(n) => {
            qb.push(" AND counter > ").push_bind(n);
        }
        None => {}
    }
}
