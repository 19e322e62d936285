//! CollectorOrchestrator - Router report ingestion
//!
//! ## Responsibilities
//!
//! - Confirm panic reports with the alarm validator and publish accepted alarms
//! - Record vehicle positions for ordinary reports
//! - Keep the per-device traffic row current
//!
//! ## Flow
//!
//! ```text
//! IngestRequest
//!   ├─ scare "P" + confirm 1|2 → validate → publish (success) → traffic(is_alarm)
//!   └─ otherwise              → resolve → position (vehicle)  → traffic(false)
//! ```

mod position_recorder;
mod resolver;
mod service;

pub use position_recorder::PositionRecorder;
pub use resolver::{Resolution, RouterResolver};
pub use service::{
    alarm_type_for, AlarmFields, CollectorService, CollectorStores, ALARM_TYPE_ELEVATED,
    ALARM_TYPE_STANDARD,
};
