//! Alarm Collector Library
//!
//! Ingests router telemetry and panic reports, confirms alarms and keeps
//! per-device traffic state.
//!
//! ## Architecture
//!
//! 1. PayloadDecoder - Positional router string to `IngestRequest`
//! 2. CollectorOrchestrator - Panic confirmation / position update / traffic upsert
//! 3. AlarmValidator - External panic confirmation
//! 4. EventPublisher - Alarm events to the message bus
//! 5. TrafficStore - Per-device traffic rows (primary DB)
//! 6. LegacyStore - Routers, units, alarms, locations (legacy DB)
//! 7. TrafficService - Traffic listing and management
//! 8. WebAPI - REST API endpoints

pub mod alarm_validator;
pub mod collector_orchestrator;
pub mod error;
pub mod event_publisher;
pub mod legacy_store;
pub mod models;
pub mod payload_decoder;
pub mod state;
pub mod traffic_service;
pub mod traffic_store;
pub mod web_api;

pub use error::{Error, Result};
pub use state::AppState;
