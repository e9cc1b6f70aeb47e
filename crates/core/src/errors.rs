use thiserror::Error;

/// 控制台错误类型定义
#[derive(Debug, Error)]
pub enum CrawlAdminError {
    #[error("爬取请求不存在: {name}")]
    UnknownCrawlRequest { name: String },

    #[error("爬取请求已存在: {name}")]
    DuplicateCrawlRequest { name: String },

    #[error("任务不存在: {job_id}")]
    UnknownJob { job_id: String },

    #[error("未知的任务模板: {0}")]
    UnknownTemplate(String),

    #[error("加载任务模板失败: {template} - {message}")]
    TemplateLoad { template: String, message: String },

    #[error("无效的参数: {0}")]
    InvalidParameters(String),

    #[error("无效的URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("定时任务已存在: {crawl_request} / {job_name} @ {hour:02}:{minute:02}")]
    DuplicateSchedule {
        crawl_request: String,
        job_name: String,
        hour: u32,
        minute: u32,
    },

    #[error("定时任务不存在: {id}")]
    ScheduleNotFound { id: String },

    #[error("后端服务不可用: {backend} - {message}")]
    BackendUnavailable { backend: String, message: String },

    #[error("任务 {job_id} 已提交到爬虫引擎，但记录到爬取请求 {crawl_request} 失败: {message}")]
    PartialLaunchInconsistency {
        job_id: String,
        crawl_request: String,
        message: String,
    },

    #[error("数据库操作错误: {0}")]
    Database(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 统一的Result类型
pub type CrawlAdminResult<T> = std::result::Result<T, CrawlAdminError>;

impl CrawlAdminError {
    pub fn unknown_crawl_request<S: Into<String>>(name: S) -> Self {
        Self::UnknownCrawlRequest { name: name.into() }
    }
    pub fn unknown_job<S: Into<String>>(job_id: S) -> Self {
        Self::UnknownJob {
            job_id: job_id.into(),
        }
    }
    pub fn invalid_params<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameters(msg.into())
    }
    pub fn backend_unavailable<B: Into<String>, M: Into<String>>(backend: B, message: M) -> Self {
        Self::BackendUnavailable {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// 只有后端暂时不可用才值得重试，其余错误都是逻辑错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, CrawlAdminError::BackendUnavailable { .. })
    }

    /// 在调用任何外部服务之前就能发现的错误
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CrawlAdminError::InvalidParameters(_)
                | CrawlAdminError::InvalidUrl { .. }
                | CrawlAdminError::UnknownTemplate(_)
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            CrawlAdminError::UnknownCrawlRequest { .. } => "UNKNOWN_CRAWL_REQUEST",
            CrawlAdminError::DuplicateCrawlRequest { .. } => "DUPLICATE_CRAWL_REQUEST",
            CrawlAdminError::UnknownJob { .. } => "UNKNOWN_JOB",
            CrawlAdminError::UnknownTemplate(_) => "UNKNOWN_TEMPLATE",
            CrawlAdminError::TemplateLoad { .. } => "TEMPLATE_LOAD_ERROR",
            CrawlAdminError::InvalidParameters(_) => "INVALID_PARAMETERS",
            CrawlAdminError::InvalidUrl { .. } => "INVALID_URL",
            CrawlAdminError::DuplicateSchedule { .. } => "DUPLICATE_SCHEDULE",
            CrawlAdminError::ScheduleNotFound { .. } => "SCHEDULE_NOT_FOUND",
            CrawlAdminError::BackendUnavailable { .. } => "BACKEND_UNAVAILABLE",
            CrawlAdminError::PartialLaunchInconsistency { .. } => "PARTIAL_LAUNCH_INCONSISTENCY",
            CrawlAdminError::Database(_) => "DATABASE_ERROR",
            CrawlAdminError::Serialization(_) => "SERIALIZATION_ERROR",
            CrawlAdminError::Configuration(_) => "CONFIGURATION_ERROR",
            CrawlAdminError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<sqlx::Error> for CrawlAdminError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                CrawlAdminError::backend_unavailable("store", err.to_string())
            }
            other => CrawlAdminError::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CrawlAdminError {
    fn from(err: serde_json::Error) -> Self {
        CrawlAdminError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for CrawlAdminError {
    fn from(err: serde_yaml::Error) -> Self {
        CrawlAdminError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for CrawlAdminError {
    fn from(err: anyhow::Error) -> Self {
        CrawlAdminError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_backend_errors_are_retryable() {
        assert!(CrawlAdminError::backend_unavailable("crawl_engine", "timeout").is_retryable());
        assert!(!CrawlAdminError::unknown_job("job-1").is_retryable());
        assert!(!CrawlAdminError::invalid_params("empty").is_retryable());
        assert!(!CrawlAdminError::PartialLaunchInconsistency {
            job_id: "a-1".to_string(),
            crawl_request: "a".to_string(),
            message: "disk full".to_string(),
        }
        .is_retryable());
    }

    #[test]
    fn test_validation_errors() {
        assert!(CrawlAdminError::UnknownTemplate("9".to_string()).is_validation());
        assert!(CrawlAdminError::InvalidUrl {
            url: "ftp://x".to_string(),
            reason: "scheme".to_string(),
        }
        .is_validation());
        assert!(!CrawlAdminError::unknown_crawl_request("x").is_validation());
    }

    #[test]
    fn test_pool_timeout_maps_to_backend_unavailable() {
        let err: CrawlAdminError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.error_code(), "BACKEND_UNAVAILABLE");

        let err: CrawlAdminError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_display_duplicate_schedule() {
        let err = CrawlAdminError::DuplicateSchedule {
            crawl_request: "example-site".to_string(),
            job_name: "daily".to_string(),
            hour: 3,
            minute: 5,
        };
        assert!(err.to_string().contains("03:05"));
    }
}
