use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use crawl_admin_core::JobStatus;
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiResult,
    extract::ApiJson,
    response::{success, success_with_message},
    routes::AppState,
};

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: JobStatus,
}

#[derive(Debug, Deserialize)]
pub struct BulkUrlsRequest {
    pub urls: Vec<String>,
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let record = state.gateway.get_job(&id).await?;
    Ok(success(record))
}

/// 从爬虫引擎读取任务状态
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let status = state.gateway.get_job_status(&id).await?;
    Ok(success(JobStatusResponse { job_id: id, status }))
}

pub async fn stop_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let status = state.launcher.stop_job(&id).await?;
    Ok(success(JobStatusResponse { job_id: id, status }))
}

pub async fn add_bulk_urls(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<BulkUrlsRequest>,
) -> ApiResult<impl IntoResponse> {
    state.launcher.add_bulk_urls(&id, &request.urls).await?;
    let record = state.gateway.get_job(&id).await?;
    Ok(success_with_message(
        record.bulk_urls,
        format!("已记录任务 {} 的批量URL", id),
    ))
}
