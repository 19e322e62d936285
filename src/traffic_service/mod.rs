//! TrafficService - Traffic management API
//!
//! ## Responsibilities
//!
//! - Parse and sanitize listing filters
//! - Page through traffic rows
//! - Delete rows and reset their counters

mod service;
mod types;

pub use service::TrafficService;
pub use types::*;
