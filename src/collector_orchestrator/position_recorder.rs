//! Vehicle position history

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

use super::resolver::Resolution;
use crate::error::Result;
use crate::legacy_store::{
    AlarmRepository, FacilityLocation, FacilityLocationRepository, LocationRepository,
    NewLocation, RouterRepository,
};
use crate::models::RequestContext;

/// Records a vehicle position: router position, location row and the
/// facility-location link, in that order.
pub struct PositionRecorder {
    routers: Arc<dyn RouterRepository>,
    alarms: Arc<dyn AlarmRepository>,
    locations: Arc<dyn LocationRepository>,
    facility_locations: Arc<dyn FacilityLocationRepository>,
}

impl PositionRecorder {
    pub fn new(
        routers: Arc<dyn RouterRepository>,
        alarms: Arc<dyn AlarmRepository>,
        locations: Arc<dyn LocationRepository>,
        facility_locations: Arc<dyn FacilityLocationRepository>,
    ) -> Self {
        Self {
            routers,
            alarms,
            locations,
            facility_locations,
        }
    }

    pub async fn record(
        &self,
        ctx: &RequestContext,
        resolution: &Resolution,
        latitude: &str,
        longitude: &str,
    ) -> Result<i64> {
        // A failed alarm lookup counts as "no open alarm".
        let open_alarm = match self.alarms.find_open_by_router_id(resolution.router_id).await {
            Ok(alarm) => alarm,
            Err(e) => {
                warn!(request_id = %ctx.request_id, router_id = resolution.router_id, error = %e, "Open alarm lookup failed");
                None
            }
        };

        self.routers
            .update_position(resolution.router_id, latitude, longitude)
            .await?;

        // Timestamp only when an alarm is open; rows without one keep NULL.
        let location = match &open_alarm {
            Some(alarm) => NewLocation {
                alarm_id: alarm.id,
                latitude: latitude.to_string(),
                longitude: longitude.to_string(),
                updated_at: Some(Utc::now()),
            },
            None => NewLocation {
                alarm_id: 0,
                latitude: latitude.to_string(),
                longitude: longitude.to_string(),
                updated_at: None,
            },
        };
        let location_id = self.locations.create(&location).await?;

        self.facility_locations
            .create(&FacilityLocation {
                unit_id: resolution.unit_id,
                location_id,
            })
            .await?;

        debug!(
            request_id = %ctx.request_id,
            router_id = resolution.router_id,
            unit_id = resolution.unit_id,
            location_id,
            alarm_id = location.alarm_id,
            "Vehicle position recorded"
        );
        Ok(location_id)
    }
}
