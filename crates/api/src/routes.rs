use axum::{
    routing::{get, post},
    Router,
};
use crawl_admin_dispatcher::{JobLauncher, ScheduleBridge};
use crawl_admin_domain::JobStoreGateway;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use crate::handlers::{
    crawl_requests::{
        create_crawl_request, get_last_config, launch_custom_job, launch_template_job,
        list_crawl_requests, schedule_job,
    },
    health::health_check,
    jobs::{add_bulk_urls, get_job, get_job_status, stop_job},
    metrics::prometheus_metrics,
    schedules::{cancel_schedule, get_schedule, list_schedules},
    templates::list_templates,
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<JobStoreGateway>,
    pub launcher: Arc<JobLauncher>,
    pub bridge: Arc<ScheduleBridge>,
    pub metrics_handle: Option<PrometheusHandle>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 健康检查
        .route("/health", get(health_check))
        .route("/metrics", get(prometheus_metrics))
        // 爬取请求
        .route(
            "/api/crawl-requests",
            get(list_crawl_requests).post(create_crawl_request),
        )
        .route("/api/crawl-requests/{name}/last-config", get(get_last_config))
        .route("/api/crawl-requests/{name}/jobs", post(launch_template_job))
        .route("/api/crawl-requests/{name}/custom-jobs", post(launch_custom_job))
        .route("/api/crawl-requests/{name}/schedules", post(schedule_job))
        // 任务
        .route("/api/jobs/{id}", get(get_job))
        .route("/api/jobs/{id}/status", get(get_job_status))
        .route("/api/jobs/{id}/stop", post(stop_job))
        .route("/api/jobs/{id}/bulk-urls", post(add_bulk_urls))
        // 定时任务
        .route("/api/schedules", get(list_schedules))
        .route("/api/schedules/{id}", get(get_schedule))
        .route("/api/schedules/{id}/cancel", post(cancel_schedule))
        .route("/api/templates", get(list_templates))
        .with_state(state)
}
