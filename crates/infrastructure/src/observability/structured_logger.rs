//! 结构化日志事件
//!
//! 每个事件带有 `event` 字段，JSON格式输出时可以直接按事件类型过滤。

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

pub struct StructuredLogger;

impl StructuredLogger {
    pub fn log_crawl_request_created(name: &str) {
        info!(
            event = "crawl_request_created",
            crawl_request.name = name,
            "爬取请求已创建"
        );
    }

    /// `source` 为 `template`、`custom` 或 `scheduled`
    pub fn log_job_launched(job_id: &str, crawl_request: &str, source: &str) {
        info!(
            event = "job_launched",
            job.id = job_id,
            crawl_request.name = crawl_request,
            job.source = source,
            "任务已启动"
        );
    }

    /// 任务已提交到爬虫引擎但没有记录到存储，需要人工补录
    pub fn log_partial_launch(
        job_id: &str,
        crawl_request: &str,
        submitted_at: DateTime<Utc>,
        cause: &str,
    ) {
        error!(
            event = "partial_launch",
            job.id = job_id,
            crawl_request.name = crawl_request,
            job.submitted_at = %submitted_at,
            error = cause,
            "任务已在爬虫引擎运行，但未能记录到爬取请求"
        );
    }

    pub fn log_job_stopped(job_id: &str, already_stopped: bool) {
        info!(
            event = "job_stopped",
            job.id = job_id,
            job.already_stopped = already_stopped,
            "任务已停止"
        );
    }

    pub fn log_bulk_urls_added(job_id: &str, count: usize) {
        info!(
            event = "bulk_urls_added",
            job.id = job_id,
            bulk_urls.count = count,
            "批量URL已记录"
        );
    }

    /// 任务已启动但批量URL没有写入任务记录，`bulk_urls` 保留原始列表用于补录
    pub fn log_bulk_urls_lost(job_id: &str, crawl_request: &str, urls: &[String], cause: &str) {
        error!(
            event = "bulk_urls_lost",
            job.id = job_id,
            crawl_request.name = crawl_request,
            bulk_urls.count = urls.len(),
            bulk_urls = %urls.join(" "),
            error = cause,
            "任务已启动，但批量URL未能记录"
        );
    }

    pub fn log_schedule_registered(
        schedule_id: &str,
        crawl_request: &str,
        job_name: &str,
        hour: u32,
        minute: u32,
    ) {
        info!(
            event = "schedule_registered",
            schedule.id = schedule_id,
            crawl_request.name = crawl_request,
            schedule.job_name = job_name,
            schedule.time = %format!("{hour:02}:{minute:02}"),
            "定时任务已注册"
        );
    }

    pub fn log_schedule_cancelled(schedule_id: &str) {
        info!(
            event = "schedule_cancelled",
            schedule.id = schedule_id,
            "定时任务已取消"
        );
    }

    pub fn log_schedule_fired(schedule_id: &str, job_id: &str, slot: DateTime<Utc>) {
        info!(
            event = "schedule_fired",
            schedule.id = schedule_id,
            job.id = job_id,
            schedule.slot = %slot,
            "定时任务已触发"
        );
    }

    pub fn log_schedule_fire_failed(schedule_id: &str, slot: DateTime<Utc>, cause: &str) {
        warn!(
            event = "schedule_fire_failed",
            schedule.id = schedule_id,
            schedule.slot = %slot,
            error = cause,
            "定时任务触发失败，保持注册状态"
        );
    }
}
