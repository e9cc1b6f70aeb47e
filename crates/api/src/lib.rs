//! # Crawl Admin API
//!
//! 爬虫任务管理控制台的REST API，基于Axum。
//!
//! 所有成功响应都包装为 `{success, data, message, timestamp}`，
//! 错误响应为 `{success: false, error: {type, message, code, suggestions}}`。
//!
//! ## API 端点
//!
//! ### 爬取请求
//! - `GET /api/crawl-requests` - 所有爬取请求及其任务状态
//! - `POST /api/crawl-requests` - 创建爬取请求
//! - `GET /api/crawl-requests/{name}/last-config` - 预填的任务配置
//! - `POST /api/crawl-requests/{name}/jobs` - 按模板启动任务
//! - `POST /api/crawl-requests/{name}/custom-jobs` - 提交自定义配置
//! - `POST /api/crawl-requests/{name}/schedules` - 注册每日定时任务
//!
//! ### 任务
//! - `GET /api/jobs/{id}` - 任务记录
//! - `GET /api/jobs/{id}/status` - 从爬虫引擎读取状态
//! - `POST /api/jobs/{id}/stop` - 停止任务
//! - `POST /api/jobs/{id}/bulk-urls` - 记录批量URL
//!
//! ### 定时任务与模板
//! - `GET /api/schedules?crawl_request=` - 定时任务列表
//! - `GET /api/schedules/{id}` - 定时任务详情
//! - `POST /api/schedules/{id}/cancel` - 取消定时任务
//! - `GET /api/templates` - 内置模板
//!
//! ### 系统
//! - `GET /health` - 健康检查
//! - `GET /metrics` - Prometheus指标
//!
//! ## 错误处理
//!
//! | 错误 | 状态码 |
//! |------|--------|
//! | 爬取请求、任务、定时任务不存在 | 404 |
//! | 名称或定时任务重复 | 409 |
//! | 参数、URL、模板无效，请求体无法解析 | 400 |
//! | 爬虫引擎或存储不可用 | 503 |
//! | 任务已提交但未记录 | 202 |

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use axum::Router;
use crawl_admin_core::ApiConfig;
use tower::ServiceBuilder;

use middleware::{cors_layer, request_logging, trace_layer};
pub use routes::{create_routes, AppState};

/// 创建完整的API应用
pub fn create_app(state: AppState, config: &ApiConfig) -> Router {
    let router = create_routes(state);

    let router = if config.cors_enabled {
        router.layer(cors_layer(&config.cors_origins))
    } else {
        router
    };

    router.layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(axum::middleware::from_fn(request_logging)),
    )
}
