//! LegacyStore - Tables owned by the legacy platform database
//!
//! Routers, units and alarms are read; router positions, locations and
//! facility-location links are written on vehicle position updates.

mod repository;
mod types;

pub use repository::{
    AlarmRepository, FacilityLocationRepository, LocationRepository, MySqlLegacyRepository,
    RouterRepository, UnitRepository,
};
pub use types::*;
