use axum::extract::State;

use crate::{
    error::{ApiError, ApiResult},
    routes::AppState,
};

/// Prometheus文本格式的指标，未安装指标记录器时返回404
pub async fn prometheus_metrics(State(state): State<AppState>) -> ApiResult<String> {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .ok_or(ApiError::NotFound)
}
