//! TrafficStore - Per-device traffic state
//!
//! One row per (imei, is_alarm) pair. Ingestion creates the row on first
//! sighting and afterwards bumps its counter; the management API lists,
//! deletes and resets rows.

mod repository;
mod types;

pub use repository::{MySqlTrafficRepository, TrafficRepository};
pub use types::*;
