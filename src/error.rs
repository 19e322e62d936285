//! Error handling for the alarm collector

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Fixed message returned for malformed router payloads
pub const MSG_INVALID_REQUEST_STRING: &str = "Invalid Request String";

/// Fixed message returned when ingestion fails downstream
pub const MSG_BAD_REQUEST: &str = "Bad request";

/// Error class read by the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or short router payload
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Missing required identifier
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Generic bad request (ingestion failed downstream)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unauthorized
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// No matching record
    #[error("Not found: {0}")]
    NotFound(String),

    /// Alarm validator unreachable or answered 5xx
    #[error("Transport error: {0}")]
    Transport(String),

    /// Store read/write failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Broker did not accept an event
    #[error("Publish error: {0}")]
    Publish(String),

    /// Request deadline exceeded
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Config error
    #[error("Config error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Class of this error, used to pick the HTTP status
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidFormat(_) | Error::InvalidArgument(_) | Error::BadRequest(_) => {
                ErrorKind::BadRequest
            }
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Transport(_)
            | Error::Persistence(_)
            | Error::Publish(_)
            | Error::Timeout(_)
            | Error::Config(_)
            | Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidFormat(_) => "invalid_format",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::BadRequest(_) => "bad_request",
            Error::Unauthorized(_) => "unauthorized",
            Error::NotFound(_) => "not_found",
            Error::Transport(_) => "transport_error",
            Error::Persistence(_) => "persistence_error",
            Error::Publish(_) => "publish_error",
            Error::Timeout(_) => "timeout",
            Error::Config(_) => "config_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Message exposed to callers (no wrapping prefix)
    pub fn message(&self) -> String {
        match self {
            Error::InvalidFormat(msg)
            | Error::InvalidArgument(msg)
            | Error::BadRequest(msg)
            | Error::Unauthorized(msg)
            | Error::NotFound(msg)
            | Error::Transport(msg)
            | Error::Persistence(msg)
            | Error::Publish(msg)
            | Error::Timeout(msg)
            | Error::Config(msg)
            | Error::Internal(msg) => msg.clone(),
        }
    }

    pub fn invalid_request_string() -> Self {
        Error::InvalidFormat(MSG_INVALID_REQUEST_STRING.to_string())
    }

    pub fn generic_bad_request() -> Self {
        Error::BadRequest(MSG_BAD_REQUEST.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.kind().status();
        let code = self.code();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!(status = %status, code = %code, message = %message, "Request error");
        } else {
            tracing::warn!(status = %status, code = %code, message = %message, "Request rejected");
        }

        let body = Json(json!({
            "code": code,
            "message": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_to_status() {
        assert_eq!(
            Error::invalid_request_string().kind().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::InvalidArgument("Invalid trafficID".into()).kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(
            Error::Unauthorized("x".into()).kind().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::NotFound("x".into()).kind().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Persistence("x".into()).kind().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(Error::Timeout("x".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_generic_bad_request_hides_cause() {
        let err = Error::generic_bad_request();
        assert_eq!(err.code(), "bad_request");
        assert_eq!(err.message(), MSG_BAD_REQUEST);
    }

    #[test]
    fn test_message_has_no_display_prefix() {
        let err = Error::invalid_request_string();
        assert_eq!(err.message(), "Invalid Request String");
        assert_eq!(err.to_string(), "Invalid format: Invalid Request String");
    }

    #[test]
    fn test_server_side_errors_are_internal() {
        let errors = [
            Error::Transport("t".into()),
            Error::Persistence("p".into()),
            Error::Publish("b".into()),
            Error::Timeout("d".into()),
            Error::Config("c".into()),
            Error::Internal("i".into()),
        ];
        let codes: Vec<&str> = errors.iter().map(Error::code).collect();
        assert_eq!(
            codes,
            [
                "transport_error",
                "persistence_error",
                "publish_error",
                "timeout",
                "config_error",
                "internal_error"
            ]
        );
        for err in &errors {
            assert_eq!(err.kind().status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(err.message().len(), 1);
        }
    }
}
