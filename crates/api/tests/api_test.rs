use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use crawl_admin_api::{create_routes, AppState};
use crawl_admin_core::{JobStatus, RetryPolicy};
use crawl_admin_dispatcher::{JobLauncher, ScheduleBridge};
use crawl_admin_domain::{JobStoreGateway, TemplateRenderer};
use crawl_admin_infrastructure::MetricsCollector;
use crawl_admin_testing_utils::{InMemoryJobStore, JobConfigBuilder, MockCrawlEngine};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    engine: MockCrawlEngine,
}

fn test_app() -> TestApp {
    let store = InMemoryJobStore::new();
    let engine = MockCrawlEngine::new();
    let gateway = Arc::new(JobStoreGateway::new(
        Arc::new(store.clone()),
        Arc::new(engine.clone()),
        RetryPolicy::immediate(2),
    ));
    let launcher = Arc::new(JobLauncher::new(
        gateway.clone(),
        TemplateRenderer::embedded(),
        MetricsCollector::new(),
    ));
    let bridge = Arc::new(ScheduleBridge::new(
        Arc::new(store),
        launcher.clone(),
        MetricsCollector::new(),
        Duration::from_secs(30),
    ));

    let state = AppState {
        gateway,
        launcher,
        bridge,
        metrics_handle: None,
    };
    TestApp {
        router: create_routes(state),
        engine,
    }
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create_crawl_request(app: &TestApp, name: &str) {
    let (status, _) = send(
        &app.router,
        "POST",
        "/api/crawl-requests",
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app();
    let (status, body) = send(&app.router, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["crawl_engine"], "mock_engine");
}

#[tokio::test]
async fn test_malformed_body_uses_error_envelope() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/crawl-requests",
        Some(json!({ "title": "example-site" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["type"], "BAD_REQUEST");
    assert_eq!(body["error"]["code"], 400);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/crawl-requests",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let app = test_app();
    let (status, _) = send(&app.router, "GET", "/metrics", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_and_list_crawl_requests() {
    let app = test_app();
    create_crawl_request(&app, "example-site").await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/crawl-requests",
        Some(json!({ "name": "example-site" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["type"], "DUPLICATE_CRAWL_REQUEST");

    let (status, body) = send(&app.router, "GET", "/api/crawl-requests", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["name"], "example-site");
    assert_eq!(body["data"][0]["jobs"], json!([]));
}

#[tokio::test]
async fn test_launch_template_job_with_text_seeds() {
    let app = test_app();
    create_crawl_request(&app, "example-site").await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/crawl-requests/example-site/jobs",
        Some(json!({
            "job_type": "domain-crawl",
            "seeds": "http://a.example\nhttp://b.example",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["job_id"], "example-site-1");
    let submitted = app.engine.submitted_config("example-site-1").unwrap();
    assert_eq!(submitted.seeds().len(), 2);

    let (status, body) = send(&app.router, "GET", "/api/crawl-requests", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["jobs"][0]["job_id"], "example-site-1");
    assert_eq!(body["data"][0]["jobs"][0]["status"], "RUNNING");
}

#[tokio::test]
async fn test_template_job_errors() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/crawl-requests/missing/jobs",
        Some(json!({ "job_type": "2", "seeds": ["http://a.example"] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], "UNKNOWN_CRAWL_REQUEST");

    create_crawl_request(&app, "example-site").await;
    let (status, body) = send(
        &app.router,
        "POST",
        "/api/crawl-requests/example-site/jobs",
        Some(json!({ "job_type": "no-such-template", "seeds": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "UNKNOWN_TEMPLATE");

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/crawl-requests/example-site/jobs",
        Some(json!({
            "job_type": "domain-crawl",
            "seeds": ["http://a.example", "mailto:someone@example.com"],
            "bulk_urls": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "INVALID_URL");
    assert_eq!(app.engine.submit_count(), 0);
}

#[tokio::test]
async fn test_custom_job_lifecycle() {
    let app = test_app();
    create_crawl_request(&app, "example-site").await;

    let config = JobConfigBuilder::new().build_text();
    let (status, body) = send(
        &app.router,
        "POST",
        "/api/crawl-requests/example-site/custom-jobs",
        Some(json!({ "job_name": "example-site-9", "job_config": config })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["config"]["id"], "example-site-9");

    let (status, body) = send(&app.router, "GET", "/api/jobs/example-site-9", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["crawl_request_name"], "example-site");

    app.engine.set_status("example-site-9", JobStatus::Finished);
    let (status, body) = send(&app.router, "GET", "/api/jobs/example-site-9/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "FINISHED");

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/jobs/example-site-9/bulk-urls",
        Some(json!({ "urls": ["http://a.example/1", "http://a.example/2"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, body) = send(&app.router, "POST", "/api/jobs/example-site-9/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "STOPPED");

    let (status, _) = send(&app.router, "GET", "/api/jobs/nope-1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_job_status_backend_unavailable() {
    let app = test_app();
    create_crawl_request(&app, "example-site").await;
    let config = JobConfigBuilder::new().build_text();
    send(
        &app.router,
        "POST",
        "/api/crawl-requests/example-site/custom-jobs",
        Some(json!({ "job_name": "example-site-1", "job_config": config })),
    )
    .await;

    app.engine.fail_status_calls(10);
    let (status, body) = send(&app.router, "GET", "/api/jobs/example-site-1/status", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["type"], "BACKEND_UNAVAILABLE");

    // 总览使用缓存状态，不会失败
    let (status, body) = send(&app.router, "GET", "/api/crawl-requests", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["jobs"][0]["stale"], true);
}

#[tokio::test]
async fn test_last_config_prefill() {
    let app = test_app();
    create_crawl_request(&app, "example-site").await;

    let (status, body) = send(
        &app.router,
        "GET",
        "/api/crawl-requests/example-site/last-config",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["config"], Value::Null);

    let config = JobConfigBuilder::new().with_warc_prefix("kept").build_text();
    send(
        &app.router,
        "POST",
        "/api/crawl-requests/example-site/custom-jobs",
        Some(json!({ "job_name": "example-site-5", "job_config": config })),
    )
    .await;

    let (_, body) = send(
        &app.router,
        "GET",
        "/api/crawl-requests/example-site/last-config",
        None,
    )
    .await;
    let text = body["data"]["config"].as_str().unwrap();
    assert!(text.contains("kept"));
    assert!(!text.contains("example-site-5"));
}

#[tokio::test]
async fn test_schedule_endpoints() {
    let app = test_app();
    create_crawl_request(&app, "example-site").await;
    let config = JobConfigBuilder::new().build_text();

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/crawl-requests/example-site/schedules",
        Some(json!({ "job_name": "nightly", "job_config": config, "hour": 2, "minute": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/crawl-requests/example-site/schedules",
        Some(json!({ "job_name": "nightly", "job_config": config, "hour": 2, "minute": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["type"], "DUPLICATE_SCHEDULE");

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/crawl-requests/example-site/schedules",
        Some(json!({ "job_name": "late", "job_config": config, "hour": 25, "minute": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "INVALID_PARAMETERS");

    let (status, body) = send(
        &app.router,
        "GET",
        "/api/schedules?crawl_request=example-site",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert!(body["data"][0]["next_fire_at"].is_string());

    let uri = format!("/api/schedules/{id}/cancel");
    let (status, body) = send(&app.router, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "CANCELLED");
    assert_eq!(body["data"]["next_fire_at"], Value::Null);

    let (status, _) = send(&app.router, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app.router, "POST", "/api/schedules/unknown/cancel", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], "SCHEDULE_NOT_FOUND");
}

#[tokio::test]
async fn test_list_templates() {
    let app = test_app();
    let (status, body) = send(&app.router, "GET", "/api/templates", None).await;

    assert_eq!(status, StatusCode::OK);
    let templates = body["data"].as_array().unwrap();
    assert_eq!(templates.len(), 5);
    assert_eq!(templates[0]["name"], "single-page");
}
