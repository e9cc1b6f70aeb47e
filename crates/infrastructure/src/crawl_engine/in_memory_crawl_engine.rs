use std::collections::HashMap;

use async_trait::async_trait;
use crawl_admin_core::{CrawlAdminError, CrawlAdminResult, CrawlEngine, JobConfig, JobStatus};
use tokio::sync::RwLock;
use tracing::info;

/// 只保存状态的爬虫引擎，提交的任务直接进入 `RUNNING`
#[derive(Debug, Default)]
pub struct InMemoryCrawlEngine {
    jobs: RwLock<HashMap<String, JobStatus>>,
}

impl InMemoryCrawlEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 模拟引擎侧的状态变化
    pub async fn set_status(&self, job_id: &str, status: JobStatus) {
        self.jobs.write().await.insert(job_id.to_string(), status);
    }
}

#[async_trait]
impl CrawlEngine for InMemoryCrawlEngine {
    async fn submit_job(&self, job_id: &str, _config: &JobConfig) -> CrawlAdminResult<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(job_id) {
            return Err(CrawlAdminError::invalid_params(format!(
                "爬虫引擎中已存在任务: {job_id}"
            )));
        }
        jobs.insert(job_id.to_string(), JobStatus::Running);
        info!("内存爬虫引擎接收任务: {}", job_id);
        Ok(())
    }

    async fn job_status(&self, job_id: &str) -> CrawlAdminResult<JobStatus> {
        self.jobs
            .read()
            .await
            .get(job_id)
            .copied()
            .ok_or_else(|| CrawlAdminError::unknown_job(job_id))
    }

    async fn stop_job(&self, job_id: &str) -> CrawlAdminResult<()> {
        let mut jobs = self.jobs.write().await;
        let status = jobs
            .get_mut(job_id)
            .ok_or_else(|| CrawlAdminError::unknown_job(job_id))?;
        if !status.is_terminal() {
            *status = JobStatus::Stopped;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}
