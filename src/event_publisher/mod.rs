//! EventPublisher - Alarm events to the message bus
//!
//! Events go to a Kafka REST proxy (`POST {base_url}/topics/{topic}`).
//! Publishing is best effort: failures are reported as `false` and the
//! caller only logs them.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Topic consumed by the monitoring webhook bridge
pub const DEFAULT_ALARM_TOPIC: &str = "webhook-omniview";

/// Event type of an accepted alarm
pub const EVENT_ALARM_ACCEPTED: &str = "alarm.accepted";

/// Source tag of events produced here
pub const EVENT_SOURCE: &str = "collector";

const KAFKA_JSON_CONTENT_TYPE: &str = "application/vnd.kafka.json.v2+json";

/// Broker settings
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub base_url: String,
    pub alarm_topic: String,
    pub timeout: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8082".to_string(),
            alarm_topic: DEFAULT_ALARM_TOPIC.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Alarm accepted payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmEvent {
    /// Correlation id (request id of the ingestion)
    pub id: String,
    pub imei: String,
    pub latitude: String,
    pub longitude: String,
    pub alarm_type: String,
    pub waiting: String,
    pub attending: String,
    /// RFC 3339 UTC
    pub event_date: String,
}

impl AlarmEvent {
    pub fn format_event_date(at: DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Envelope carried on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub id: String,
    pub event_type: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub payload: AlarmEvent,
}

impl EventEnvelope {
    pub fn alarm_accepted(payload: AlarmEvent) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type: EVENT_ALARM_ACCEPTED.to_string(),
            source: EVENT_SOURCE.to_string(),
            created_at: Utc::now(),
            payload,
        }
    }
}

/// Publishes events to a topic
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// `true` when the broker accepted the event
    async fn publish(&self, topic: &str, event: &EventEnvelope) -> bool;
}

/// Kafka REST proxy publisher
pub struct HttpBrokerPublisher {
    http: Client,
    base_url: String,
}

impl HttpBrokerPublisher {
    pub fn new(config: &BrokerConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build broker client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn records_body(event: &EventEnvelope) -> serde_json::Value {
        json!({
            "records": [
                { "key": event.payload.imei, "value": event }
            ]
        })
    }
}

#[async_trait]
impl EventPublisher for HttpBrokerPublisher {
    async fn publish(&self, topic: &str, event: &EventEnvelope) -> bool {
        let url = format!("{}/topics/{}", self.base_url, topic);

        let result = self
            .http
            .post(&url)
            .header(header::CONTENT_TYPE, KAFKA_JSON_CONTENT_TYPE)
            .body(Self::records_body(event).to_string())
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                debug!(topic, event_id = %event.id, "Event published");
                true
            }
            Ok(resp) => {
                warn!(topic, event_id = %event.id, status = %resp.status(), "Broker rejected event");
                false
            }
            Err(e) => {
                warn!(topic, event_id = %event.id, error = %e, "Broker unreachable");
                false
            }
        }
    }
}
