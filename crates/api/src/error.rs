use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crawl_admin_core::CrawlAdminError;
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("控制台错误: {0}")]
    CrawlAdmin(#[from] CrawlAdminError),

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("未找到资源")]
    NotFound,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, String, String, Vec<String>) {
        let err = match self {
            ApiError::CrawlAdmin(err) => err,
            ApiError::BadRequest(msg) => {
                return (
                    StatusCode::BAD_REQUEST,
                    format!("请求参数错误: {}", msg),
                    "BAD_REQUEST".to_string(),
                    vec!["请检查请求格式和参数".to_string()],
                )
            }
            ApiError::NotFound => {
                return (
                    StatusCode::NOT_FOUND,
                    "请求的资源不存在".to_string(),
                    "NOT_FOUND".to_string(),
                    vec!["请检查请求URL是否正确".to_string()],
                )
            }
        };

        let error_type = err.error_code().to_string();
        let (status, suggestions) = match err {
            CrawlAdminError::UnknownCrawlRequest { .. } => (
                StatusCode::NOT_FOUND,
                vec![
                    "请检查爬取请求名称是否正确".to_string(),
                    "使用 GET /api/crawl-requests 查看所有爬取请求".to_string(),
                ],
            ),
            CrawlAdminError::UnknownJob { .. } => (
                StatusCode::NOT_FOUND,
                vec!["请检查任务ID是否正确".to_string()],
            ),
            CrawlAdminError::ScheduleNotFound { .. } => (
                StatusCode::NOT_FOUND,
                vec!["使用 GET /api/schedules 查看所有定时任务".to_string()],
            ),
            CrawlAdminError::DuplicateCrawlRequest { .. } => (
                StatusCode::CONFLICT,
                vec!["爬取请求名称必须唯一，请换一个名称".to_string()],
            ),
            CrawlAdminError::DuplicateSchedule { .. } => (
                StatusCode::CONFLICT,
                vec!["相同名称和时间的定时任务已经注册".to_string()],
            ),
            CrawlAdminError::UnknownTemplate(_) => (
                StatusCode::BAD_REQUEST,
                vec!["使用 GET /api/templates 查看可用的模板".to_string()],
            ),
            CrawlAdminError::InvalidParameters(_) => (
                StatusCode::BAD_REQUEST,
                vec!["请检查请求参数和任务配置".to_string()],
            ),
            CrawlAdminError::InvalidUrl { .. } => (
                StatusCode::BAD_REQUEST,
                vec![
                    "只支持 http 和 https 协议".to_string(),
                    "修正或删除无法解析的URL后重新提交".to_string(),
                ],
            ),
            CrawlAdminError::BackendUnavailable { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                vec!["后端服务暂时不可用，请稍后重试".to_string()],
            ),
            CrawlAdminError::PartialLaunchInconsistency { .. } => (
                StatusCode::ACCEPTED,
                vec![
                    "任务已在爬虫引擎中运行，但没有记录到存储".to_string(),
                    "请根据日志中的 partial_launch 事件手动补录".to_string(),
                ],
            ),
            CrawlAdminError::TemplateLoad { .. }
            | CrawlAdminError::Database(_)
            | CrawlAdminError::Serialization(_)
            | CrawlAdminError::Configuration(_)
            | CrawlAdminError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                vec!["系统遇到内部错误，请稍后重试".to_string()],
            ),
        };

        (status, err.to_string(), error_type, suggestions)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_type, suggestions) = self.parts();

        if status.is_server_error() {
            error!("请求处理失败: {}", self);
        }

        let body = Json(json!({
            "success": false,
            "error": {
                "message": error_message,
                "type": error_type,
                "code": status.as_u16(),
                "suggestions": suggestions,
            },
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
