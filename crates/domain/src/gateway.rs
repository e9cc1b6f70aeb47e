use std::sync::Arc;

use chrono::{DateTime, Utc};
use crawl_admin_core::{
    CrawlAdminError, CrawlAdminResult, CrawlEngine, CrawlRequest, JobConfig, JobRecord,
    JobRepository, JobStatus, RetryPolicy,
};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

/// 总览中的单个任务状态
#[derive(Debug, Clone, Serialize)]
pub struct JobStatusView {
    pub job_id: String,
    pub status: JobStatus,
    /// 爬虫引擎暂时不可用，状态取自本地缓存
    pub stale: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlRequestOverview {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub jobs: Vec<JobStatusView>,
}

/// 爬取请求与任务记录的统一入口
///
/// 读操作（任务状态）遇到 `BackendUnavailable` 会按重试策略重试，
/// 写操作只执行一次。
pub struct JobStoreGateway {
    repository: Arc<dyn JobRepository>,
    engine: Arc<dyn CrawlEngine>,
    retry: RetryPolicy,
}

impl JobStoreGateway {
    pub fn new(
        repository: Arc<dyn JobRepository>,
        engine: Arc<dyn CrawlEngine>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            repository,
            engine,
            retry,
        }
    }

    pub fn engine(&self) -> &Arc<dyn CrawlEngine> {
        &self.engine
    }

    pub async fn create_crawl_request(&self, name: &str) -> CrawlAdminResult<CrawlRequest> {
        CrawlRequest::validate_name(name)?;
        let request = self.repository.create_crawl_request(name).await?;
        info!("创建爬取请求: {}", name);
        Ok(request)
    }

    pub async fn get_crawl_request(&self, name: &str) -> CrawlAdminResult<CrawlRequest> {
        self.repository
            .get_crawl_request(name)
            .await?
            .ok_or_else(|| CrawlAdminError::unknown_crawl_request(name))
    }

    /// 按名称排序
    pub async fn list_crawl_requests(&self) -> CrawlAdminResult<Vec<CrawlRequest>> {
        let mut requests = self.repository.list_crawl_requests().await?;
        requests.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(requests)
    }

    /// 生成 `<爬取请求名称>-<序号>` 形式的任务ID
    pub async fn generate_job_id(&self, name: &str) -> CrawlAdminResult<String> {
        let sequence = self.repository.next_job_sequence(name).await?;
        let job_id = format!("{name}-{sequence}");
        debug!("生成任务ID: {}", job_id);
        Ok(job_id)
    }

    pub async fn get_last_job_config(&self, name: &str) -> CrawlAdminResult<Option<JobConfig>> {
        self.get_crawl_request(name).await?;
        self.repository.get_last_job_config(name).await
    }

    pub async fn record_job(
        &self,
        name: &str,
        job_id: &str,
        config: &JobConfig,
    ) -> CrawlAdminResult<()> {
        self.get_crawl_request(name).await?;
        if self.repository.get_job(job_id).await?.is_some() {
            return Err(CrawlAdminError::invalid_params(format!(
                "任务ID已被使用: {job_id}"
            )));
        }

        let record = JobRecord::new(job_id.to_string(), name.to_string(), config.clone());
        self.repository.record_job(&record).await?;
        debug!("记录任务 {} 到爬取请求 {}", job_id, name);
        Ok(())
    }

    pub async fn get_job(&self, job_id: &str) -> CrawlAdminResult<JobRecord> {
        self.repository
            .get_job(job_id)
            .await?
            .ok_or_else(|| CrawlAdminError::unknown_job(job_id))
    }

    pub async fn is_recorded(&self, job_id: &str) -> CrawlAdminResult<bool> {
        Ok(self.repository.get_job(job_id).await?.is_some())
    }

    pub async fn update_job_status(&self, job_id: &str, status: JobStatus) -> CrawlAdminResult<()> {
        self.repository.update_job_status(job_id, status).await
    }

    pub async fn add_bulk_urls(&self, job_id: &str, urls: &[String]) -> CrawlAdminResult<()> {
        self.get_job(job_id).await?;
        self.repository.add_bulk_urls(job_id, urls).await
    }

    /// 从爬虫引擎读取任务状态并缓存
    ///
    /// 本地已记为 `STOPPED` 的任务不会被引擎返回的非终态覆盖。
    pub async fn get_job_status(&self, job_id: &str) -> CrawlAdminResult<JobStatus> {
        let record = self.get_job(job_id).await?;
        let status = self
            .retry
            .run("job_status", || self.engine.job_status(job_id))
            .await
            .map_err(|e| self.engine_error(job_id, e))?;

        if record.is_stopped() && !status.is_terminal() {
            return Ok(JobStatus::Stopped);
        }

        if status != record.status {
            if let Err(e) = self.repository.update_job_status(job_id, status).await {
                warn!("缓存任务 {} 状态失败: {}", job_id, e);
            }
        }
        Ok(status)
    }

    /// 已记录的任务在爬虫引擎中找不到时按引擎异常处理，`UnknownJob` 只表示本地没有记录
    pub fn engine_error(&self, job_id: &str, error: CrawlAdminError) -> CrawlAdminError {
        match error {
            CrawlAdminError::UnknownJob { .. } => CrawlAdminError::backend_unavailable(
                self.engine.name(),
                format!("爬虫引擎中找不到已记录的任务 {job_id}"),
            ),
            other => other,
        }
    }

    async fn job_status_view(&self, job_id: &str) -> CrawlAdminResult<JobStatusView> {
        let record = self.get_job(job_id).await?;
        match self.get_job_status(job_id).await {
            Ok(status) => Ok(JobStatusView {
                job_id: job_id.to_string(),
                status,
                stale: false,
            }),
            Err(e) => {
                warn!("读取任务 {} 状态失败，使用缓存: {}", job_id, e);
                Ok(JobStatusView {
                    job_id: job_id.to_string(),
                    status: record.status,
                    stale: true,
                })
            }
        }
    }

    /// 所有爬取请求及其任务状态
    pub async fn crawl_request_overview(&self) -> CrawlAdminResult<Vec<CrawlRequestOverview>> {
        let requests = self.list_crawl_requests().await?;
        let mut overview = Vec::with_capacity(requests.len());

        for request in requests {
            let views = join_all(request.job_list.iter().map(|id| self.job_status_view(id))).await;
            let jobs = views
                .into_iter()
                .filter_map(|view| match view {
                    Ok(view) => Some(Ok(view)),
                    Err(CrawlAdminError::UnknownJob { job_id }) => {
                        warn!("爬取请求 {} 的任务列表包含未记录的任务 {}", request.name, job_id);
                        None
                    }
                    Err(e) => Some(Err(e)),
                })
                .collect::<CrawlAdminResult<Vec<_>>>()?;

            overview.push(CrawlRequestOverview {
                name: request.name,
                created_at: request.created_at,
                jobs,
            });
        }

        Ok(overview)
    }
}
