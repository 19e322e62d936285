//! PayloadDecoder - Router payload parsing
//!
//! Routers report a positional, comma-separated string:
//!
//! ```text
//! gprs,_,ip,imei,unit_id,_,lat,long,_,_,_,confirm_panic[,attending]
//! ```
//!
//! Only the fields listed above are consulted. Anything past the 13th field
//! is ignored.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Minimum number of comma-separated fields in a valid payload
pub const MIN_FIELDS: usize = 12;

const IDX_GPRS: usize = 0;
const IDX_IP: usize = 2;
const IDX_IMEI: usize = 3;
const IDX_UNIT_ID: usize = 4;
const IDX_LATITUDE: usize = 6;
const IDX_LONGITUDE: usize = 7;
const IDX_CONFIRM_PANIC: usize = 11;
const IDX_ATTENDING: usize = 12;

/// Scare class of a panic button report
pub const SCARE_PANIC: &str = "P";

/// Decoded router report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub gprs: String,
    pub scare: String,
    pub imei: Option<String>,
    #[serde(rename = "unitID")]
    pub unit_id: Option<String>,
    pub latitude: String,
    pub longitude: String,
    pub attending: String,
    pub confirm_panic: String,
    pub ip: String,
    #[serde(rename = "request")]
    pub raw_request: String,
}

impl IngestRequest {
    /// Panic press confirmed by the router (standard or elevated)
    pub fn is_confirmed_panic(&self) -> bool {
        self.scare == SCARE_PANIC && matches!(self.confirm_panic.as_str(), "1" | "2")
    }

    /// IMEI or empty string when the report only carried a unit id
    pub fn imei_or_empty(&self) -> &str {
        self.imei.as_deref().unwrap_or_default()
    }
}

/// Decode a router report.
///
/// `raw_query` is the `router` query value; `path_param` is used when the
/// query value is empty. The IP is taken from field 2, then from `referer`,
/// then from `remote_addr`.
pub fn decode(
    raw_query: Option<&str>,
    path_param: Option<&str>,
    referer: Option<&str>,
    remote_addr: &str,
) -> Result<IngestRequest> {
    let mut collect = strip_whitespace(raw_query.unwrap_or_default());
    if collect.is_empty() {
        collect = strip_whitespace(path_param.unwrap_or_default());
    }

    let fields: Vec<&str> = collect.split(',').collect();
    if fields.len() < MIN_FIELDS {
        return Err(Error::invalid_request_string());
    }

    let ip = if !fields[IDX_IP].is_empty() {
        fields[IDX_IP].to_string()
    } else {
        match referer.map(|r| r.trim_end_matches('/')) {
            Some(r) if !r.is_empty() => r.to_string(),
            _ => remote_addr.to_string(),
        }
    };

    let (imei, unit_id) = if !fields[IDX_IMEI].is_empty() {
        (Some(fields[IDX_IMEI].to_string()), None)
    } else if !fields[IDX_UNIT_ID].is_empty() {
        (None, Some(fields[IDX_UNIT_ID].to_string()))
    } else {
        return Err(Error::invalid_request_string());
    };

    let gprs = fields[IDX_GPRS].to_string();
    let scare = gprs
        .chars()
        .last()
        .map(|c| c.to_uppercase().collect::<String>())
        .unwrap_or_default();

    Ok(IngestRequest {
        scare,
        gprs,
        imei,
        unit_id,
        latitude: or_zero(fields[IDX_LATITUDE]),
        longitude: or_zero(fields[IDX_LONGITUDE]),
        attending: fields
            .get(IDX_ATTENDING)
            .map(|s| s.to_string())
            .unwrap_or_else(|| "0".to_string()),
        confirm_panic: fields[IDX_CONFIRM_PANIC].to_string(),
        ip,
        raw_request: collect.clone(),
    })
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

fn or_zero(value: &str) -> String {
    if value.is_empty() {
        "0".to_string()
    } else {
        value.to_string()
    }
}
