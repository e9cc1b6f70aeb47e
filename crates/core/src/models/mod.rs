//! # 数据模型
//!
//! 控制台的核心数据结构：爬取请求、任务记录、任务配置文档和定时任务。
//!
//! ## 状态管理
//!
//! ### 任务状态流转
//! ```text
//! PENDING → RUNNING → FINISHED
//!    ↓         ↓
//!  STOPPED   FAILED
//! ```
//!
//! 状态由爬虫引擎驱动，控制台只负责读取和停止操作。`STOPPED` 是单向状态。
//!
//! ### 定时任务状态流转
//! ```text
//! REGISTERED → (每次触发) → REGISTERED
//!      ↓
//!  CANCELLED
//! ```

pub mod crawl_request;
pub mod job;
pub mod job_config;
pub mod scheduled_job;

pub use crawl_request::CrawlRequest;
pub use job::{JobRecord, JobStatus};
pub use job_config::JobConfig;
pub use scheduled_job::{ScheduleKey, ScheduleState, ScheduledJob};
