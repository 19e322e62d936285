//! In-memory collaborators shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alarm_collector::alarm_validator::{AlarmValidator, ValidationResponse};
use alarm_collector::collector_orchestrator::{CollectorService, CollectorStores};
use alarm_collector::error::{Error, Result};
use alarm_collector::event_publisher::{EventEnvelope, EventPublisher, DEFAULT_ALARM_TOPIC};
use alarm_collector::legacy_store::{
    AlarmRecord, AlarmRepository, FacilityLocation, FacilityLocationRepository,
    LocationRepository, NewLocation, RouterRecord, RouterRepository, UnitRecord, UnitRepository,
};
use alarm_collector::state::{AppConfig, AppState};
use alarm_collector::traffic_service::TrafficService;
use alarm_collector::traffic_store::{TrafficFilter, TrafficModel, TrafficRepository};

/// Row predicates of `MySqlTrafficRepository::retrieve`: `q` matches any text
/// column, the other text filters are substring matches, `counter = 0` is exact
/// and any other counter means `counter > n`.
fn filter_matches(filter: &TrafficFilter, row: &TrafficModel) -> bool {
    let contains = |haystack: &str, needle: &Option<String>| match needle {
        Some(n) => haystack.contains(n.as_str()),
        None => true,
    };

    if let Some(q) = filter.q.as_deref() {
        if !(row.id.contains(q) || row.request.contains(q) || row.imei.contains(q) || row.ip.contains(q)) {
            return false;
        }
    }
    if !contains(&row.id, &filter.id)
        || !contains(&row.request, &filter.request)
        || !contains(&row.imei, &filter.imei)
        || !contains(&row.ip, &filter.ip)
    {
        return false;
    }
    if filter.is_alarm.is_some_and(|a| a != row.is_alarm) {
        return false;
    }
    match filter.counter {
        Some(0) => row.counter == 0,
        Some(n) => row.counter > n,
        None => true,
    }
}

/// Ordered record of every collaborator call
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.entries().iter().position(|e| e.starts_with(prefix))
    }
}

// ========================================
// Traffic
// ========================================

#[derive(Default)]
pub struct MemoryTraffic {
    pub journal: Journal,
    pub rows: Mutex<Vec<TrafficModel>>,
    pub fail_lookup: bool,
    pub fail_create: bool,
    pub fail_update: bool,
    pub fail_reads: bool,
}

impl MemoryTraffic {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            ..Default::default()
        }
    }

    pub fn with_rows(journal: Journal, rows: Vec<TrafficModel>) -> Self {
        Self {
            journal,
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    pub fn rows(&self) -> Vec<TrafficModel> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrafficRepository for MemoryTraffic {
    async fn create(&self, model: &TrafficModel) -> Result<()> {
        self.journal.push(format!("traffic.create is_alarm={}", model.is_alarm));
        if self.fail_create {
            return Err(Error::Persistence("insert failed".into()));
        }
        self.rows.lock().unwrap().push(model.clone());
        Ok(())
    }

    async fn exists_by_imei(&self, imei: &str, is_alarm: bool) -> Result<bool> {
        self.journal.push(format!("traffic.exists is_alarm={}", is_alarm));
        if self.fail_lookup {
            return Err(Error::Persistence("lookup failed".into()));
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.imei == imei && r.is_alarm == is_alarm))
    }

    async fn update_by_imei(&self, imei: &str, request: &str, is_alarm: bool) -> Result<()> {
        self.journal.push(format!("traffic.update is_alarm={}", is_alarm));
        if self.fail_update {
            return Err(Error::Persistence("update failed".into()));
        }
        for row in self
            .rows
            .lock()
            .unwrap()
            .iter_mut()
            .filter(|r| r.imei == imei && r.is_alarm == is_alarm)
        {
            row.request = request.to_string();
            row.counter += 1;
            row.is_notified = false;
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn retrieve(&self, filter: &TrafficFilter) -> Result<Vec<TrafficModel>> {
        if self.fail_reads {
            return Err(Error::Persistence("select failed".into()));
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter_matches(filter, r))
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &TrafficFilter) -> Result<i64> {
        if self.fail_reads {
            return Err(Error::Persistence("count failed".into()));
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter_matches(filter, r))
            .count() as i64)
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        self.journal.push(format!("traffic.delete {}", id));
        if self.fail_reads {
            return Err(Error::Persistence("delete failed".into()));
        }
        self.rows.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }

    async fn reset_counter(&self, id: &str) -> Result<()> {
        self.journal.push(format!("traffic.reset {}", id));
        if self.fail_reads {
            return Err(Error::Persistence("reset failed".into()));
        }
        for row in self.rows.lock().unwrap().iter_mut().filter(|r| r.id == id) {
            row.counter = 0;
            row.updated_at = Utc::now();
        }
        Ok(())
    }
}

// ========================================
// Legacy
// ========================================

#[derive(Default)]
pub struct MemoryLegacy {
    pub journal: Journal,
    pub routers: Mutex<Vec<RouterRecord>>,
    pub units: Vec<UnitRecord>,
    pub alarms: Vec<AlarmRecord>,
    pub locations: Mutex<Vec<NewLocation>>,
    pub links: Mutex<Vec<FacilityLocation>>,
    pub fail_position_update: bool,
    pub fail_alarm_lookup: bool,
}

impl MemoryLegacy {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            ..Default::default()
        }
    }

    /// One router with one unit
    pub fn with_unit(journal: Journal, imei: &str, is_vehicle: bool) -> Self {
        Self {
            journal,
            routers: Mutex::new(vec![RouterRecord {
                id: 7,
                imei: imei.to_string(),
                latitude: None,
                longitude: None,
            }]),
            units: vec![UnitRecord {
                id: 70,
                router_id: 7,
                is_vehicle,
            }],
            ..Default::default()
        }
    }

    pub fn locations(&self) -> Vec<NewLocation> {
        self.locations.lock().unwrap().clone()
    }

    pub fn links(&self) -> Vec<FacilityLocation> {
        self.links.lock().unwrap().clone()
    }
}

#[async_trait]
impl RouterRepository for MemoryLegacy {
    async fn find_by_imei(&self, imei: &str) -> Result<RouterRecord> {
        self.journal.push("router.find");
        self.routers
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.imei == imei)
            .cloned()
            .ok_or_else(|| Error::NotFound("Router information not found".into()))
    }

    async fn update_position(&self, router_id: i64, latitude: &str, longitude: &str) -> Result<()> {
        self.journal.push("router.update_position");
        if self.fail_position_update {
            return Err(Error::Persistence("router update failed".into()));
        }
        for router in self
            .routers
            .lock()
            .unwrap()
            .iter_mut()
            .filter(|r| r.id == router_id)
        {
            router.latitude = Some(latitude.to_string());
            router.longitude = Some(longitude.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl UnitRepository for MemoryLegacy {
    async fn find_by_router_id(&self, router_id: i64) -> Result<UnitRecord> {
        self.journal.push("unit.find");
        self.units
            .iter()
            .find(|u| u.router_id == router_id)
            .cloned()
            .ok_or_else(|| Error::NotFound("Unit information not found".into()))
    }
}

#[async_trait]
impl AlarmRepository for MemoryLegacy {
    async fn find_open_by_router_id(&self, router_id: i64) -> Result<Option<AlarmRecord>> {
        self.journal.push("alarm.find_open");
        if self.fail_alarm_lookup {
            return Err(Error::Persistence("alarm lookup failed".into()));
        }
        let mut open: Vec<&AlarmRecord> = self
            .alarms
            .iter()
            .filter(|a| a.router_id == router_id && (a.waiting == 1 || a.attending == 1))
            .collect();
        open.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(open.first().map(|a| (*a).clone()))
    }
}

#[async_trait]
impl LocationRepository for MemoryLegacy {
    async fn create(&self, location: &NewLocation) -> Result<i64> {
        self.journal.push("location.create");
        let mut locations = self.locations.lock().unwrap();
        locations.push(location.clone());
        Ok(100 + locations.len() as i64)
    }
}

#[async_trait]
impl FacilityLocationRepository for MemoryLegacy {
    async fn create(&self, link: &FacilityLocation) -> Result<()> {
        self.journal.push("facility_location.create");
        self.links.lock().unwrap().push(link.clone());
        Ok(())
    }
}

// ========================================
// Validator / publisher
// ========================================

pub enum ValidatorReply {
    Success(bool),
    Fail,
    Hang,
}

pub struct StubValidator {
    pub journal: Journal,
    pub reply: ValidatorReply,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl StubValidator {
    pub fn new(journal: Journal, reply: ValidatorReply) -> Self {
        Self {
            journal,
            reply,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AlarmValidator for StubValidator {
    async fn validate(&self, imei: &str, alarm_type: &str) -> Result<ValidationResponse> {
        self.journal.push(format!("validator.validate type={}", alarm_type));
        self.calls
            .lock()
            .unwrap()
            .push((imei.to_string(), alarm_type.to_string()));
        match self.reply {
            ValidatorReply::Success(success) => Ok(ValidationResponse {
                success,
                ..Default::default()
            }),
            ValidatorReply::Fail => Err(Error::Transport("validator down".into())),
            ValidatorReply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(ValidationResponse::default())
            }
        }
    }
}

pub struct StubPublisher {
    pub journal: Journal,
    pub accept: bool,
    pub events: Mutex<Vec<(String, EventEnvelope)>>,
}

impl StubPublisher {
    pub fn new(journal: Journal, accept: bool) -> Self {
        Self {
            journal,
            accept,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<(String, EventEnvelope)> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for StubPublisher {
    async fn publish(&self, topic: &str, event: &EventEnvelope) -> bool {
        self.journal.push("publisher.publish");
        self.events
            .lock()
            .unwrap()
            .push((topic.to_string(), event.clone()));
        self.accept
    }
}

// ========================================
// Wiring
// ========================================

pub struct Harness {
    pub journal: Journal,
    pub traffic: Arc<MemoryTraffic>,
    pub legacy: Arc<MemoryLegacy>,
    pub validator: Arc<StubValidator>,
    pub publisher: Arc<StubPublisher>,
}

impl Harness {
    pub fn new(
        journal: Journal,
        traffic: MemoryTraffic,
        legacy: MemoryLegacy,
        validator: StubValidator,
        publisher: StubPublisher,
    ) -> Self {
        Self {
            journal,
            traffic: Arc::new(traffic),
            legacy: Arc::new(legacy),
            validator: Arc::new(validator),
            publisher: Arc::new(publisher),
        }
    }

    /// Empty stores, validator answering `success`, accepting broker
    pub fn simple(success: bool) -> Self {
        let journal = Journal::default();
        Self::new(
            journal.clone(),
            MemoryTraffic::new(journal.clone()),
            MemoryLegacy::new(journal.clone()),
            StubValidator::new(journal.clone(), ValidatorReply::Success(success)),
            StubPublisher::new(journal, true),
        )
    }

    pub fn collector(&self) -> CollectorService {
        CollectorService::new(
            CollectorStores {
                traffic: self.traffic.clone(),
                routers: self.legacy.clone(),
                units: self.legacy.clone(),
                alarms: self.legacy.clone(),
                locations: self.legacy.clone(),
                facility_locations: self.legacy.clone(),
            },
            self.validator.clone(),
            self.publisher.clone(),
            DEFAULT_ALARM_TOPIC,
        )
    }

    pub fn app_state(&self, config: AppConfig) -> AppState {
        AppState::new(
            config,
            self.collector(),
            TrafficService::new(self.traffic.clone()),
        )
        .unwrap()
    }
}

/// Config that never touches the environment-dependent endpoints
pub fn test_config() -> AppConfig {
    AppConfig {
        request_timeout: Duration::from_secs(5),
        traffic_api_token: None,
        ..AppConfig::default()
    }
}

pub fn traffic_row(id: &str, imei: &str, is_alarm: bool, counter: i32) -> TrafficModel {
    let mut row = TrafficModel::new(imei, "P,12,12", "10.0.0.1", is_alarm);
    row.id = id.to_string();
    row.counter = counter;
    row
}
