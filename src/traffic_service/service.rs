//! TrafficService implementation

use std::sync::Arc;
use tracing::error;

use super::types::{FilterRequest, Traffic};
use crate::error::{Error, Result};
use crate::models::{PaginatedResponse, RequestContext};
use crate::traffic_store::TrafficRepository;

/// Traffic listing and management
pub struct TrafficService {
    repo: Arc<dyn TrafficRepository>,
}

impl TrafficService {
    pub fn new(repo: Arc<dyn TrafficRepository>) -> Self {
        Self { repo }
    }

    pub async fn retrieve(&self, ctx: &RequestContext, filter: &FilterRequest) -> Result<Vec<Traffic>> {
        let models = self
            .repo
            .retrieve(&filter.to_store_filter())
            .await
            .map_err(|e| {
                error!(request_id = %ctx.request_id, error = %e, "Failed to retrieve traffics");
                e
            })?;

        Ok(models.into_iter().map(Traffic::from).collect())
    }

    /// One page plus the total count of matching rows
    pub async fn retrieve_page(
        &self,
        ctx: &RequestContext,
        filter: &FilterRequest,
    ) -> Result<PaginatedResponse<Traffic>> {
        let data = self.retrieve(ctx, filter).await?;
        let total = self
            .repo
            .count(&filter.to_store_filter())
            .await
            .map_err(|e| {
                error!(request_id = %ctx.request_id, error = %e, "Failed to count traffics");
                e
            })?;

        Ok(PaginatedResponse::new(data, filter.page, filter.size, total))
    }

    pub async fn delete(&self, ctx: &RequestContext, traffic_id: &str) -> Result<()> {
        let traffic_id = Self::require_id(traffic_id)?;

        self.repo.delete_by_id(traffic_id).await.map_err(|e| {
            error!(request_id = %ctx.request_id, traffic_id, error = %e, "Failed to delete traffic resource");
            e
        })
    }

    pub async fn reset_counter(&self, ctx: &RequestContext, traffic_id: &str) -> Result<()> {
        let traffic_id = Self::require_id(traffic_id)?;

        self.repo.reset_counter(traffic_id).await.map_err(|e| {
            error!(request_id = %ctx.request_id, traffic_id, error = %e, "Failed to reset traffic counter");
            e
        })
    }

    fn require_id(traffic_id: &str) -> Result<&str> {
        let traffic_id = traffic_id.trim();
        if traffic_id.is_empty() {
            return Err(Error::InvalidArgument("Invalid trafficID".to_string()));
        }
        Ok(traffic_id)
    }
}
