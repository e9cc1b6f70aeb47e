//! # Crawl Admin Testing Utils
//!
//! 各crate测试共用的替身实现和测试数据构造器。
//!
//! ```toml
//! [dev-dependencies]
//! crawl-admin-testing-utils = { path = "../testing-utils" }
//! ```
//!
//! - `MockCrawlEngine` - 可注入故障、统计调用次数的爬虫引擎
//! - `FailingJobRepository` - 记录任务时失败的存储，用于部分启动场景
//! - `InMemoryJobStore` / `InMemoryCrawlEngine` - 来自infrastructure的内存实现

pub mod builders;
pub mod mocks;

pub use builders::{JobConfigBuilder, ScheduledJobBuilder};
pub use crawl_admin_infrastructure::{InMemoryCrawlEngine, InMemoryJobStore};
pub use mocks::{FailingJobRepository, MockCrawlEngine};
