use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use crawl_admin_core::ScheduledJob;
use serde::{Deserialize, Serialize};

use crate::{error::ApiResult, response::success, routes::AppState};

#[derive(Debug, Deserialize)]
pub struct ScheduleQueryParams {
    pub crawl_request: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScheduleView {
    #[serde(flatten)]
    pub schedule: ScheduledJob,
    pub next_fire_at: Option<DateTime<Utc>>,
}

impl ScheduleView {
    fn new(state: &AppState, schedule: ScheduledJob, now: DateTime<Utc>) -> Self {
        let next_fire_at = state.bridge.next_fire_time(&schedule.id, now);
        Self {
            schedule,
            next_fire_at,
        }
    }
}

pub async fn list_schedules(
    State(state): State<AppState>,
    Query(params): Query<ScheduleQueryParams>,
) -> ApiResult<impl IntoResponse> {
    let now = Utc::now();
    let schedules = state
        .bridge
        .list_schedules(params.crawl_request.as_deref())
        .await?
        .into_iter()
        .map(|schedule| ScheduleView::new(&state, schedule, now))
        .collect::<Vec<_>>();
    Ok(success(schedules))
}

pub async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let schedule = state.bridge.get_schedule(&id).await?;
    Ok(success(ScheduleView::new(&state, schedule, Utc::now())))
}

/// 取消定时任务，重复取消返回相同结果
pub async fn cancel_schedule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let schedule = state.bridge.cancel_schedule(&id).await?;
    Ok(success(ScheduleView::new(&state, schedule, Utc::now())))
}
