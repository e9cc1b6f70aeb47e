//! 持久化存储接口定义
//!
//! - `JobRepository` - 爬取请求、任务记录和任务配置历史
//! - `ScheduleRepository` - 定时任务
//!
//! 实现需要保证 `Send + Sync`，同一个实例会被并发的请求共享。
//! 当前有 SQLite 实现和内存实现（测试与本地模式使用）。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{CrawlRequest, JobConfig, JobRecord, JobStatus, ScheduleState, ScheduledJob};
use crate::CrawlAdminResult;

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// 名称已存在时返回 `DuplicateCrawlRequest`
    async fn create_crawl_request(&self, name: &str) -> CrawlAdminResult<CrawlRequest>;

    async fn get_crawl_request(&self, name: &str) -> CrawlAdminResult<Option<CrawlRequest>>;

    async fn list_crawl_requests(&self) -> CrawlAdminResult<Vec<CrawlRequest>>;

    /// 原子地递增并返回该爬取请求的任务计数器，第一次调用返回1
    ///
    /// 并发调用不会返回相同的值。爬取请求不存在时返回 `UnknownCrawlRequest`。
    async fn next_job_sequence(&self, crawl_request_name: &str) -> CrawlAdminResult<u64>;

    /// 最近一次记录的任务配置
    async fn get_last_job_config(
        &self,
        crawl_request_name: &str,
    ) -> CrawlAdminResult<Option<JobConfig>>;

    /// 追加任务到爬取请求的任务列表并保存配置
    async fn record_job(&self, record: &JobRecord) -> CrawlAdminResult<()>;

    async fn get_job(&self, job_id: &str) -> CrawlAdminResult<Option<JobRecord>>;

    async fn update_job_status(&self, job_id: &str, status: JobStatus) -> CrawlAdminResult<()>;

    async fn add_bulk_urls(&self, job_id: &str, urls: &[String]) -> CrawlAdminResult<()>;
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn create_schedule(&self, schedule: &ScheduledJob) -> CrawlAdminResult<()>;

    async fn get_schedule(&self, id: &str) -> CrawlAdminResult<Option<ScheduledJob>>;

    async fn list_schedules(
        &self,
        crawl_request_name: Option<&str>,
    ) -> CrawlAdminResult<Vec<ScheduledJob>>;

    async fn update_schedule_state(&self, id: &str, state: ScheduleState) -> CrawlAdminResult<()>;

    async fn record_schedule_fired(&self, id: &str, fired_at: DateTime<Utc>)
        -> CrawlAdminResult<()>;
}
