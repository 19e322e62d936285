//! CollectorService - Ingestion decision flow

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::position_recorder::PositionRecorder;
use super::resolver::RouterResolver;
use crate::alarm_validator::{AlarmValidator, ValidationResponse};
use crate::error::{Error, Result};
use crate::event_publisher::{AlarmEvent, EventEnvelope, EventPublisher};
use crate::legacy_store::{
    AlarmRepository, FacilityLocationRepository, LocationRepository, RouterRepository,
    UnitRepository,
};
use crate::models::RequestContext;
use crate::payload_decoder::IngestRequest;
use crate::traffic_store::{TrafficModel, TrafficRepository};

/// Alarm type for a standard confirmed panic
pub const ALARM_TYPE_STANDARD: &str = "0";

/// Alarm type for an elevated confirmed panic
pub const ALARM_TYPE_ELEVATED: &str = "3";

/// Storage collaborators of the collector
#[derive(Clone)]
pub struct CollectorStores {
    pub traffic: Arc<dyn TrafficRepository>,
    pub routers: Arc<dyn RouterRepository>,
    pub units: Arc<dyn UnitRepository>,
    pub alarms: Arc<dyn AlarmRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub facility_locations: Arc<dyn FacilityLocationRepository>,
}

/// Fields of a confirmed alarm, before it becomes an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmFields {
    pub imei: String,
    pub latitude: String,
    pub longitude: String,
    pub alarm_type: String,
    pub attending: String,
    pub waiting: String,
}

impl AlarmFields {
    fn from_request(req: &IngestRequest, alarm_type: &str) -> Self {
        let waiting = if req.attending == "0" { "1" } else { "0" };
        Self {
            imei: req.imei_or_empty().to_string(),
            latitude: req.latitude.clone(),
            longitude: req.longitude.clone(),
            alarm_type: alarm_type.to_string(),
            attending: req.attending.clone(),
            waiting: waiting.to_string(),
        }
    }

    fn into_event(self, request_id: &str) -> AlarmEvent {
        AlarmEvent {
            id: request_id.to_string(),
            imei: self.imei,
            latitude: self.latitude,
            longitude: self.longitude,
            alarm_type: self.alarm_type,
            waiting: self.waiting,
            attending: self.attending,
            event_date: AlarmEvent::format_event_date(Utc::now()),
        }
    }
}

/// Alarm type sent to the validator for a confirm-panic level
pub fn alarm_type_for(confirm_panic: &str) -> &'static str {
    if confirm_panic == "2" {
        ALARM_TYPE_ELEVATED
    } else {
        ALARM_TYPE_STANDARD
    }
}

/// Orchestrates one ingestion: panic confirmation or position update,
/// then the traffic upsert.
pub struct CollectorService {
    traffic: Arc<dyn TrafficRepository>,
    resolver: RouterResolver,
    positions: PositionRecorder,
    validator: Arc<dyn AlarmValidator>,
    publisher: Arc<dyn EventPublisher>,
    alarm_topic: String,
}

impl CollectorService {
    pub fn new(
        stores: CollectorStores,
        validator: Arc<dyn AlarmValidator>,
        publisher: Arc<dyn EventPublisher>,
        alarm_topic: impl Into<String>,
    ) -> Self {
        Self {
            traffic: stores.traffic,
            resolver: RouterResolver::new(stores.routers.clone(), stores.units),
            positions: PositionRecorder::new(
                stores.routers,
                stores.alarms,
                stores.locations,
                stores.facility_locations,
            ),
            validator,
            publisher,
            alarm_topic: alarm_topic.into(),
        }
    }

    pub async fn collect(&self, ctx: &RequestContext, req: &IngestRequest) -> Result<()> {
        if req.is_confirmed_panic() {
            self.collect_panic(ctx, req).await
        } else {
            self.collect_position(ctx, req).await
        }
    }

    async fn collect_panic(&self, ctx: &RequestContext, req: &IngestRequest) -> Result<()> {
        let imei = req.imei_or_empty();
        let alarm_type = alarm_type_for(&req.confirm_panic);

        let response = match self.validator.validate(imei, alarm_type).await {
            Ok(resp) => resp,
            Err(e) => {
                error!(request_id = %ctx.request_id, imei, error = %e, "Error when validating IMEI");
                ValidationResponse::default()
            }
        };

        let is_alarm = response.success;
        if is_alarm {
            let fields = AlarmFields::from_request(req, alarm_type);
            match self.publish_alarm_event(ctx, fields).await {
                Ok(event_id) => {
                    info!(request_id = %ctx.request_id, event_id = %event_id, "Alarm accepted event published")
                }
                Err(e) => {
                    error!(request_id = %ctx.request_id, imei, error = %e, "Alarm event could not be published")
                }
            }
        }

        self.upsert_traffic(ctx, req, is_alarm)
            .await
            .map_err(|_| Error::generic_bad_request())
    }

    async fn collect_position(&self, ctx: &RequestContext, req: &IngestRequest) -> Result<()> {
        let resolution = self.resolver.resolve(req.imei.as_deref()).await;

        if resolution.is_vehicle {
            if let Err(e) = self
                .positions
                .record(ctx, &resolution, &req.latitude, &req.longitude)
                .await
            {
                error!(request_id = %ctx.request_id, imei = req.imei_or_empty(), error = %e, "Vehicle position update failed");
                return Err(Error::generic_bad_request());
            }
        }

        self.upsert_traffic(ctx, req, false)
            .await
            .map_err(|_| Error::generic_bad_request())
    }

    /// Create the (imei, is_alarm) row or bump its counter.
    ///
    /// A failed existence check is read as "absent", so transient read
    /// errors and concurrent first sightings can both create duplicates.
    pub async fn upsert_traffic(
        &self,
        ctx: &RequestContext,
        req: &IngestRequest,
        is_alarm: bool,
    ) -> Result<()> {
        let imei = req.imei_or_empty();

        let exists = match self.traffic.exists_by_imei(imei, is_alarm).await {
            Ok(found) => found,
            Err(e) => {
                warn!(request_id = %ctx.request_id, imei, error = %e, "Traffic lookup failed, treating as absent");
                false
            }
        };

        if !exists {
            let model = TrafficModel::new(imei, &req.raw_request, &req.ip, is_alarm);
            if let Err(e) = self.traffic.create(&model).await {
                error!(request_id = %ctx.request_id, imei, error = %e, "Error when creating traffic");
                return Err(e);
            }
            return Ok(());
        }

        if let Err(e) = self
            .traffic
            .update_by_imei(imei, &req.raw_request, is_alarm)
            .await
        {
            error!(request_id = %ctx.request_id, imei, error = %e, "Error when updating traffic");
        }
        Ok(())
    }

    async fn publish_alarm_event(&self, ctx: &RequestContext, fields: AlarmFields) -> Result<String> {
        let envelope = EventEnvelope::alarm_accepted(fields.into_event(&ctx.request_id));

        if !self.publisher.publish(&self.alarm_topic, &envelope).await {
            return Err(Error::Publish(format!(
                "event [{}] could not be published",
                envelope.event_type
            )));
        }
        Ok(envelope.id)
    }
}
