//! AlarmValidator - Panic confirmation against the monitoring backend
//!
//! ## Responsibilities
//!
//! - Ask the backend whether a panic report from an IMEI is a real alarm
//! - Retry transient failures (network errors, 429, 5xx) with bounded backoff
//! - Decode 2xx-4xx answers as structured responses
//!
//! The backend is an internal peer with a self-signed certificate, so
//! certificate validation is disabled on this client.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default validation endpoint path
pub const DEFAULT_VALIDATE_PATH: &str = "/v1/colector/alarm";

/// Validator client settings
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub base_url: String,
    pub path: String,
    /// Per-attempt timeout
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_wait_min: Duration,
    pub retry_wait_max: Duration,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost:8443".to_string(),
            path: DEFAULT_VALIDATE_PATH.to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_wait_min: Duration::from_secs(1),
            retry_wait_max: Duration::from_secs(5),
        }
    }
}

/// Validation request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub imei: String,
    #[serde(rename = "unitID")]
    pub unit_id: String,
    /// Alarm type ("0" standard, "3" elevated)
    #[serde(rename = "input")]
    pub alarm_type: String,
}

/// Validation response body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Confirms panic reports
#[async_trait]
pub trait AlarmValidator: Send + Sync {
    async fn validate(&self, imei: &str, alarm_type: &str) -> Result<ValidationResponse>;
}

/// Exponential backoff between `wait_min` and `wait_max`
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub wait_min: Duration,
    pub wait_max: Duration,
}

impl RetryPolicy {
    /// Wait before retry number `attempt` (0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.wait_min
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.wait_max)
    }

    fn retryable_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS
            || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
    }
}

/// HTTP validator client
pub struct HttpAlarmValidator {
    http: Client,
    url: String,
    retry: RetryPolicy,
}

impl HttpAlarmValidator {
    pub fn new(config: &ValidatorConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build alarm validator client: {}", e)))?;

        Ok(Self {
            http,
            url: format!("{}{}", config.base_url.trim_end_matches('/'), config.path),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                wait_min: config.retry_wait_min,
                wait_max: config.retry_wait_max.max(config.retry_wait_min),
            },
        })
    }
}

#[async_trait]
impl AlarmValidator for HttpAlarmValidator {
    async fn validate(&self, imei: &str, alarm_type: &str) -> Result<ValidationResponse> {
        let body = ValidationRequest {
            imei: imei.to_string(),
            unit_id: String::new(),
            alarm_type: alarm_type.to_string(),
        };

        let mut attempt: u32 = 0;
        loop {
            let sent = self
                .http
                .post(&self.url)
                .header(header::ACCEPT, "application/json")
                .json(&body)
                .send()
                .await;

            let response = match sent {
                Ok(resp) => resp,
                Err(e) if attempt < self.retry.max_retries => {
                    let wait = self.retry.backoff(attempt);
                    warn!(imei, attempt, wait_ms = wait.as_millis() as u64, error = %e, "alarm_client: request failed, retrying");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                    continue;
                }
                Err(e) => {
                    return Err(Error::Transport(format!("alarm_client: error doing request: {}", e)));
                }
            };

            let status = response.status();
            if RetryPolicy::retryable_status(status) && attempt < self.retry.max_retries {
                let wait = self.retry.backoff(attempt);
                warn!(imei, attempt, status = %status, wait_ms = wait.as_millis() as u64, "alarm_client: retryable status");
                tokio::time::sleep(wait).await;
                attempt += 1;
                continue;
            }

            let text = response
                .text()
                .await
                .map_err(|e| Error::Transport(format!("alarm_client: error reading response: {}", e)))?;

            if status.as_u16() < 200 || status.is_server_error() {
                return Err(Error::Transport(format!(
                    "alarm_client: service responded with {} status code, response body: {}",
                    status, text
                )));
            }

            let parsed: ValidationResponse = serde_json::from_str(&text).map_err(|e| {
                Error::Transport(format!("alarm_client: error parsing response body: {}", e))
            })?;

            debug!(imei, status = %status, success = parsed.success, "alarm_client: validation answered");
            return Ok(parsed);
        }
    }
}
