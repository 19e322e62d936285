//! Application state
//!
//! Holds the configuration and the shared services

use prometheus::{IntCounter, Registry, TextEncoder};
use std::sync::Arc;
use std::time::Duration;

use crate::alarm_validator::{ValidatorConfig, DEFAULT_VALIDATE_PATH};
use crate::collector_orchestrator::CollectorService;
use crate::error::{Error, Result};
use crate::event_publisher::{BrokerConfig, DEFAULT_ALARM_TOPIC};
use crate::traffic_service::TrafficService;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Primary database URL (traffic table)
    pub database_url: String,
    /// Legacy platform database URL (routers, units, alarms, locations)
    pub legacy_database_url: String,
    pub db_max_connections: u32,
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Deadline for one ingestion request
    pub request_timeout: Duration,
    pub validator: ValidatorConfig,
    pub broker: BrokerConfig,
    /// Token required by the traffic management routes (unset = open)
    pub traffic_api_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: env_or("DATABASE_URL", "mysql://root@localhost/collector"),
            legacy_database_url: env_or("LEGACY_DATABASE_URL", "mysql://root@localhost/legacy"),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 10),
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse("PORT", 8080),
            request_timeout: Duration::from_secs(env_parse("REQUEST_TIMEOUT_SECS", 90)),
            validator: ValidatorConfig {
                base_url: env_or("ALARM_VALIDATOR_URL", "https://localhost:8443"),
                path: env_or("ALARM_VALIDATOR_PATH", DEFAULT_VALIDATE_PATH),
                timeout: Duration::from_secs(env_parse("ALARM_VALIDATOR_TIMEOUT_SECS", 10)),
                max_retries: env_parse("ALARM_VALIDATOR_MAX_RETRIES", 3),
                retry_wait_min: Duration::from_secs(env_parse(
                    "ALARM_VALIDATOR_RETRY_WAIT_MIN_SECS",
                    1,
                )),
                retry_wait_max: Duration::from_secs(env_parse(
                    "ALARM_VALIDATOR_RETRY_WAIT_MAX_SECS",
                    5,
                )),
            },
            broker: BrokerConfig {
                base_url: env_or("BROKER_URL", "http://localhost:8082"),
                alarm_topic: env_or("ALARM_TOPIC", DEFAULT_ALARM_TOPIC),
                timeout: Duration::from_secs(env_parse("BROKER_TIMEOUT_SECS", 5)),
            },
            traffic_api_token: std::env::var("TRAFFIC_API_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
        }
    }
}

/// Ingestion counters exposed on `/metrics`
pub struct IngestMetrics {
    registry: Registry,
    collector_reqs_total: IntCounter,
}

impl IngestMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector_reqs_total = IntCounter::new(
            "collector_reqs_total",
            "The total number of requests to routers endpoints",
        )
        .map_err(|e| Error::Internal(format!("Failed to create metric: {}", e)))?;
        registry
            .register(Box::new(collector_reqs_total.clone()))
            .map_err(|e| Error::Internal(format!("Failed to register metric: {}", e)))?;

        Ok(Self {
            registry,
            collector_reqs_total,
        })
    }

    pub fn inc_requests(&self) {
        self.collector_reqs_total.inc();
    }

    pub fn requests(&self) -> u64 {
        self.collector_reqs_total.get()
    }

    /// Prometheus text exposition
    pub fn render(&self) -> Result<String> {
        let mut buffer = String::new();
        TextEncoder::new()
            .encode_utf8(&self.registry.gather(), &mut buffer)
            .map_err(|e| Error::Internal(format!("Failed to encode metrics: {}", e)))?;
        Ok(buffer)
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub collector: Arc<CollectorService>,
    pub traffic: Arc<TrafficService>,
    pub metrics: Arc<IngestMetrics>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        collector: CollectorService,
        traffic: TrafficService,
    ) -> Result<Self> {
        Ok(Self {
            config,
            collector: Arc::new(collector),
            traffic: Arc::new(traffic),
            metrics: Arc::new(IngestMetrics::new()?),
        })
    }
}
