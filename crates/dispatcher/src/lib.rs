//! 任务启动与定时调度
//!
//! - `JobLauncher` - 校验、提交到爬虫引擎、记录任务，停止任务
//! - `ScheduleBridge` - 每日定时任务的注册、取消与触发
//! - `CronScheduler` - CRON表达式工具

pub mod cron_utils;
pub mod launcher;
pub mod schedule_bridge;

pub use cron_utils::CronScheduler;
pub use launcher::{JobLauncher, LaunchedJob, TemplateJobRequest};
pub use schedule_bridge::ScheduleBridge;
