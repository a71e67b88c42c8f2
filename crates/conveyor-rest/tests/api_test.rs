//! HTTP API tests driving the router in-process.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use conveyor_config::ServerConfig;
use conveyor_jobs::{JobService, JobsConfig};
use conveyor_rest::{create_router, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

fn fast_config() -> JobsConfig {
    let mut config = JobsConfig::default();
    config.worker.workload_latency_ms = 5;
    config.worker.shutdown_timeout_secs = 1;
    config.sweeper.interval_ms = 25;
    config
}

fn app(service: &Arc<JobService>) -> Router {
    create_router(AppState::new(service.clone()), &ServerConfig::default())
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn test_create_and_get_job() {
    let service = Arc::new(JobService::new(fast_config()).unwrap());
    let app = app(&service);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/jobs",
        Some(json!({ "type": "send_email", "payload": { "to": "a@example.com" } })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["type"], "send_email");
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["attempts"], 0);
    assert_eq!(body["data"]["max_retries"], 3);
    assert_eq!(body["data"]["payload"]["to"], "a@example.com");

    let id = body["data"]["id"].as_str().unwrap().to_string();
    let (status, body) = send(&app, Method::GET, &format!("/api/v1/jobs/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());
}

#[tokio::test]
async fn test_create_with_explicit_retries() {
    let service = Arc::new(JobService::new(fast_config()).unwrap());
    let app = app(&service);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/jobs",
        Some(json!({ "type": "report", "max_retries": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["max_retries"], 0);
    assert_eq!(body["data"]["payload"], Value::Null);
}

#[tokio::test]
async fn test_empty_type_rejected() {
    let service = Arc::new(JobService::new(fast_config()).unwrap());
    let app = app(&service);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/jobs",
        Some(json!({ "type": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(service.list().is_empty());
}

#[tokio::test]
async fn test_unknown_job_is_404() {
    let service = Arc::new(JobService::new(fast_config()).unwrap());
    let app = app(&service);

    let (status, body) = send(&app, Method::GET, "/api/v1/jobs/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_list_is_ordered_by_creation() {
    let service = Arc::new(JobService::new(fast_config()).unwrap());
    let app = app(&service);

    for job_type in ["first", "second", "third"] {
        let body = Some(json!({ "type": job_type }));
        let (status, _) = send(&app, Method::POST, "/api/v1/jobs", body).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, Method::GET, "/api/v1/jobs", None).await;
    assert_eq!(status, StatusCode::OK);
    let types: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|j| j["type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["first", "second", "third"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_metrics_reflect_processing() {
    let service = Arc::new(JobService::new(fast_config()).unwrap());
    service.start().unwrap();
    let app = app(&service);

    send(&app, Method::POST, "/api/v1/jobs", Some(json!({ "type": "email" }))).await;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let (status, body) = send(&app, Method::GET, "/api/v1/metrics", None).await;
        assert_eq!(status, StatusCode::OK);
        if body["data"]["jobs_completed"] == 1 {
            assert_eq!(body["data"]["total_jobs_created"], 1);
            assert_eq!(body["data"]["jobs_in_progress"], 0);
            assert_eq!(body["data"]["jobs_by_status"]["completed"], 1);
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "job never completed");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    service.shutdown().await;
}

#[tokio::test]
async fn test_create_during_shutdown_is_503() {
    let service = Arc::new(JobService::new(fast_config()).unwrap());
    service.start().unwrap();
    let app = app(&service);

    let (status, _) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);

    service.shutdown().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/jobs",
        Some(json!({ "type": "email" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SHUTTING_DOWN");

    let (status, _) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_health_endpoints() {
    let service = Arc::new(JobService::new(fast_config()).unwrap());
    let app = app(&service);

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = send(&app, Method::GET, "/live", None).await;
    assert_eq!(status, StatusCode::OK);

    // Not started yet.
    let (status, _) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
