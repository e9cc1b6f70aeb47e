use std::sync::Arc;

use chrono::Utc;
use crawl_admin_core::{
    CrawlAdminError, CrawlAdminResult, CrawlEngine, JobConfig, JobStatus, ScheduledJob,
};
use crawl_admin_domain::{JobStoreGateway, JobTemplate, JobTemplateParams, SeedNormalizer, TemplateRenderer};
use crawl_admin_infrastructure::{MetricsCollector, StructuredLogger};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::schedule_bridge::ScheduleBridge;

/// 模板任务请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateJobRequest {
    pub template: JobTemplate,
    pub seeds: Vec<String>,
    #[serde(default)]
    pub warc_prefix: String,
    #[serde(default)]
    pub ignore_robots: bool,
    /// 批量模式：种子按站点归一化，原始URL作为批量URL记录
    #[serde(default)]
    pub bulk_urls: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LaunchedJob {
    pub job_id: String,
    pub crawl_request_name: String,
    pub config: JobConfig,
}

/// 任务启动器
///
/// 先校验，再提交到爬虫引擎，最后记录到存储。写操作不自动重试。
pub struct JobLauncher {
    gateway: Arc<JobStoreGateway>,
    renderer: TemplateRenderer,
    metrics: MetricsCollector,
}

impl JobLauncher {
    pub fn new(
        gateway: Arc<JobStoreGateway>,
        renderer: TemplateRenderer,
        metrics: MetricsCollector,
    ) -> Self {
        Self {
            gateway,
            renderer,
            metrics,
        }
    }

    pub fn gateway(&self) -> &Arc<JobStoreGateway> {
        &self.gateway
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    fn engine(&self) -> &Arc<dyn CrawlEngine> {
        self.gateway.engine()
    }

    /// 提交自定义任务配置
    pub async fn launch_job(
        &self,
        crawl_request_name: &str,
        job_id: &str,
        config_text: &str,
    ) -> CrawlAdminResult<LaunchedJob> {
        self.launch_from(crawl_request_name, job_id, config_text, "custom")
            .await
    }

    pub(crate) async fn launch_from(
        &self,
        crawl_request_name: &str,
        job_id: &str,
        config_text: &str,
        source: &str,
    ) -> CrawlAdminResult<LaunchedJob> {
        if job_id.trim().is_empty() {
            return Err(CrawlAdminError::invalid_params("任务ID不能为空"));
        }
        if job_id.chars().any(char::is_whitespace) {
            return Err(CrawlAdminError::invalid_params(format!(
                "任务ID不能包含空白字符: {job_id:?}"
            )));
        }

        let mut config = JobConfig::parse(config_text)?;
        config.ensure_id(job_id)?;

        self.gateway.get_crawl_request(crawl_request_name).await?;
        if self.gateway.is_recorded(job_id).await? {
            return Err(CrawlAdminError::invalid_params(format!(
                "任务ID已被使用: {job_id}"
            )));
        }

        self.engine().submit_job(job_id, &config).await?;
        let submitted_at = Utc::now();

        if let Err(e) = self
            .gateway
            .record_job(crawl_request_name, job_id, &config)
            .await
        {
            let cause = e.to_string();
            StructuredLogger::log_partial_launch(job_id, crawl_request_name, submitted_at, &cause);
            self.metrics.record_partial_launch();
            return Err(CrawlAdminError::PartialLaunchInconsistency {
                job_id: job_id.to_string(),
                crawl_request: crawl_request_name.to_string(),
                message: cause,
            });
        }

        StructuredLogger::log_job_launched(job_id, crawl_request_name, source);
        self.metrics.record_job_launched();

        Ok(LaunchedJob {
            job_id: job_id.to_string(),
            crawl_request_name: crawl_request_name.to_string(),
            config,
        })
    }

    /// 使用内置模板生成配置并启动
    pub async fn launch_template_job(
        &self,
        crawl_request_name: &str,
        request: &TemplateJobRequest,
    ) -> CrawlAdminResult<LaunchedJob> {
        let raw_urls: Vec<String> = request
            .seeds
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let seeds = if request.bulk_urls {
            SeedNormalizer::normalize(&raw_urls)?.into_iter().collect()
        } else {
            raw_urls.clone()
        };

        self.gateway.get_crawl_request(crawl_request_name).await?;

        // 先用占位ID渲染一次，参数有误时不消耗序号
        let mut params = JobTemplateParams {
            job_id: format!("{crawl_request_name}-0"),
            crawl_request_name: crawl_request_name.to_string(),
            warc_prefix: request.warc_prefix.clone(),
            seeds,
            ignore_robots: request.ignore_robots,
        };
        self.renderer.check(request.template, &params)?;

        let job_id = self.gateway.generate_job_id(crawl_request_name).await?;
        params.job_id = job_id.clone();
        let text = self.renderer.render(request.template, &params)?;
        debug!("模板 {} 渲染完成: {}", request.template, job_id);

        let launched = self
            .launch_from(crawl_request_name, &job_id, &text, "template")
            .await?;

        if request.bulk_urls && !raw_urls.is_empty() {
            if let Err(e) = self.add_bulk_urls(&job_id, &raw_urls).await {
                StructuredLogger::log_bulk_urls_lost(
                    &job_id,
                    crawl_request_name,
                    &raw_urls,
                    &e.to_string(),
                );
                self.metrics.record_bulk_urls_lost();
            }
        }

        Ok(launched)
    }

    /// 注册每日定时任务
    pub async fn launch_scheduled_job(
        &self,
        bridge: &ScheduleBridge,
        crawl_request_name: &str,
        job_name: &str,
        config_text: &str,
        hour: u32,
        minute: u32,
    ) -> CrawlAdminResult<ScheduledJob> {
        bridge
            .schedule_job(crawl_request_name, job_name, config_text, hour, minute)
            .await
    }

    /// 停止任务，已停止的任务直接返回
    pub async fn stop_job(&self, job_id: &str) -> CrawlAdminResult<JobStatus> {
        let record = self.gateway.get_job(job_id).await?;
        if record.is_stopped() {
            StructuredLogger::log_job_stopped(job_id, true);
            return Ok(JobStatus::Stopped);
        }

        self.engine()
            .stop_job(job_id)
            .await
            .map_err(|e| self.gateway.engine_error(job_id, e))?;
        self.gateway
            .update_job_status(job_id, JobStatus::Stopped)
            .await?;

        StructuredLogger::log_job_stopped(job_id, false);
        self.metrics.record_job_stopped();
        Ok(JobStatus::Stopped)
    }

    /// 记录批量URL，仅用于审计，不影响正在运行的抓取
    pub async fn add_bulk_urls(&self, job_id: &str, urls: &[String]) -> CrawlAdminResult<()> {
        let urls: Vec<String> = urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .collect();

        self.gateway.add_bulk_urls(job_id, &urls).await?;
        StructuredLogger::log_bulk_urls_added(job_id, urls.len());
        Ok(())
    }

    /// 新任务表单的预填内容：上一次的配置，`id` 替换为新生成的任务ID
    pub async fn prefill_job_config(
        &self,
        crawl_request_name: &str,
    ) -> CrawlAdminResult<Option<JobConfig>> {
        let Some(mut config) = self.gateway.get_last_job_config(crawl_request_name).await? else {
            return Ok(None);
        };

        let job_id = self.gateway.generate_job_id(crawl_request_name).await?;
        config.set_id(&job_id);
        info!("为爬取请求 {} 预填任务配置: {}", crawl_request_name, job_id);
        Ok(Some(config))
    }
}
