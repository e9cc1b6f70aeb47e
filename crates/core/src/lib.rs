pub mod config;
pub mod errors;
pub mod models;
pub mod retry;
pub mod traits;

pub use self::config::{
    ApiConfig, AppConfig, CrawlEngineConfig, DatabaseConfig, SchedulerConfig, TemplateConfig,
    CONFIGURATION_ENV_VAR,
};
pub use errors::*;
pub use models::{
    CrawlRequest, JobConfig, JobRecord, JobStatus, ScheduleKey, ScheduleState, ScheduledJob,
};
pub use retry::RetryPolicy;
pub use traits::{CrawlEngine, JobRepository, ScheduleRepository};
