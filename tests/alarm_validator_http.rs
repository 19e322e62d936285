//! Alarm validator client against a local HTTP backend

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alarm_collector::alarm_validator::{
    AlarmValidator, HttpAlarmValidator, ValidatorConfig, DEFAULT_VALIDATE_PATH,
};
use alarm_collector::error::Error;

/// Serve `router` on an ephemeral port and return its base URL
async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn config(base_url: String, max_retries: u32) -> ValidatorConfig {
    ValidatorConfig {
        base_url,
        timeout: Duration::from_secs(2),
        max_retries,
        retry_wait_min: Duration::from_millis(10),
        retry_wait_max: Duration::from_millis(20),
        ..Default::default()
    }
}

/// Backend answering 503 for the first `failures` calls, then `reply`
fn flaky_backend(failures: usize, reply: (StatusCode, Value), hits: Arc<AtomicUsize>) -> Router {
    Router::new().route(
        DEFAULT_VALIDATE_PATH,
        post(move |Json(body): Json<Value>| {
            let hits = hits.clone();
            let reply = reply.clone();
            async move {
                assert_eq!(body["imei"], "861585041440544");
                assert_eq!(body["input"], "3");
                let n = hits.fetch_add(1, Ordering::SeqCst);
                if n < failures {
                    (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"success": false})))
                } else {
                    (reply.0, Json(reply.1))
                }
            }
        }),
    )
}

#[tokio::test]
async fn test_retries_then_succeeds() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = spawn(flaky_backend(
        2,
        (StatusCode::OK, json!({"success": true, "message": "alarm accepted"})),
        hits.clone(),
    ))
    .await;

    let validator = HttpAlarmValidator::new(&config(base, 3)).unwrap();
    let resp = validator.validate("861585041440544", "3").await.unwrap();

    assert!(resp.success);
    assert_eq!(resp.message, "alarm accepted");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_client_error_body_is_decoded() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = spawn(flaky_backend(
        0,
        (StatusCode::NOT_FOUND, json!({"success": false, "message": "unknown imei"})),
        hits.clone(),
    ))
    .await;

    let validator = HttpAlarmValidator::new(&config(base, 3)).unwrap();
    let resp = validator.validate("861585041440544", "3").await.unwrap();

    assert!(!resp.success);
    assert_eq!(resp.message, "unknown imei");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_exhausted_retries_are_transport_errors() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = spawn(flaky_backend(
        usize::MAX,
        (StatusCode::OK, json!({"success": true})),
        hits.clone(),
    ))
    .await;

    let validator = HttpAlarmValidator::new(&config(base, 2)).unwrap();
    let err = validator.validate("861585041440544", "3").await.unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let validator = HttpAlarmValidator::new(&config("http://127.0.0.1:9".to_string(), 1)).unwrap();
    let err = validator.validate("861585041440544", "0").await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}
