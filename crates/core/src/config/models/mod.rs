pub mod api;
pub mod app_config;
pub mod crawl_engine;
pub mod database;
pub mod scheduler;
pub mod templates;

pub use api::ApiConfig;
pub use app_config::{AppConfig, CONFIGURATION_ENV_VAR};
pub use crawl_engine::CrawlEngineConfig;
pub use database::DatabaseConfig;
pub use scheduler::SchedulerConfig;
pub use templates::TemplateConfig;
