//! 进程配置
//!
//! 加载顺序（后者覆盖前者）：
//! 1. 内置默认值
//! 2. 配置文件（命令行指定，或默认路径中第一个存在的文件）
//! 3. 环境变量 `CRAWL_ADMIN_CONFIGURATION` 指定的替代配置文件
//! 4. `CRAWL_ADMIN_` 前缀的环境变量，层级用双下划线分隔，
//!    例如 `CRAWL_ADMIN_DATABASE__URL`

pub mod models;

pub use models::{
    ApiConfig, AppConfig, CrawlEngineConfig, DatabaseConfig, SchedulerConfig, TemplateConfig,
    CONFIGURATION_ENV_VAR,
};
