use async_trait::async_trait;

use crate::models::{JobConfig, JobStatus};
use crate::CrawlAdminResult;

/// 爬虫引擎客户端接口
///
/// 引擎不可达或超时必须返回 `BackendUnavailable`，不能无限期阻塞。
#[async_trait]
pub trait CrawlEngine: Send + Sync {
    /// 提交任务配置，任务以 `job_id` 标识
    async fn submit_job(&self, job_id: &str, config: &JobConfig) -> CrawlAdminResult<()>;

    /// 引擎不认识该任务时返回 `UnknownJob`
    async fn job_status(&self, job_id: &str) -> CrawlAdminResult<JobStatus>;

    /// 停止已停止的任务不是错误
    async fn stop_job(&self, job_id: &str) -> CrawlAdminResult<()>;

    fn name(&self) -> &str;
}
