use std::time::Duration;

use async_trait::async_trait;
use crawl_admin_core::{
    CrawlAdminError, CrawlAdminResult, CrawlEngine, CrawlEngineConfig, JobConfig, JobStatus,
};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, warn};
use url::Url;

const BACKEND: &str = "crawl_engine";

#[derive(Debug, Deserialize)]
struct JobStatusResponse {
    status: String,
}

/// 通过HTTP接口访问爬虫引擎
///
/// - `POST {base}/jobs` 提交 `{"id", "config"}`，`config` 为YAML文本
/// - `GET {base}/jobs/{id}` 返回 `{"status"}`
/// - `POST {base}/jobs/{id}/stop`
pub struct HttpCrawlEngine {
    base_url: Url,
    http_client: reqwest::Client,
}

impl HttpCrawlEngine {
    pub fn new(config: &CrawlEngineConfig) -> CrawlAdminResult<Self> {
        let base_url = Url::parse(&config.base_url()).map_err(|e| {
            CrawlAdminError::Configuration(format!("无效的爬虫引擎地址 {}: {e}", config.base_url()))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CrawlAdminError::Configuration(format!(
                "爬虫引擎地址不能作为基础URL: {base_url}"
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| CrawlAdminError::Configuration(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// 把非成功响应转换为错误，404视为任务不存在
    async fn check_response(response: Response, job_id: &str) -> CrawlAdminResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => Err(CrawlAdminError::unknown_job(job_id)),
            s if s.is_server_error() => {
                warn!("爬虫引擎返回错误: HTTP {} - {}", s, body);
                Err(CrawlAdminError::backend_unavailable(
                    BACKEND,
                    format!("HTTP {s}: {body}"),
                ))
            }
            s => {
                error!("爬虫引擎拒绝请求: HTTP {} - {}", s, body);
                Err(CrawlAdminError::invalid_params(format!(
                    "爬虫引擎拒绝任务 {job_id}: HTTP {s} - {body}"
                )))
            }
        }
    }
}

fn transport_error(e: reqwest::Error) -> CrawlAdminError {
    let reason = if e.is_timeout() {
        "请求超时"
    } else if e.is_connect() {
        "连接失败"
    } else {
        "请求失败"
    };
    warn!("爬虫引擎{}: {}", reason, e);
    CrawlAdminError::backend_unavailable(BACKEND, format!("{reason}: {e}"))
}

#[async_trait]
impl CrawlEngine for HttpCrawlEngine {
    async fn submit_job(&self, job_id: &str, config: &JobConfig) -> CrawlAdminResult<()> {
        let url = self.endpoint(&["jobs"]);
        let payload = json!({
            "id": job_id,
            "config": config.to_yaml()?,
        });

        let response = self
            .http_client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;
        Self::check_response(response, job_id).await?;

        info!("任务 {} 已提交到爬虫引擎", job_id);
        Ok(())
    }

    async fn job_status(&self, job_id: &str) -> CrawlAdminResult<JobStatus> {
        let url = self.endpoint(&["jobs", job_id]);
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;
        let response = Self::check_response(response, job_id).await?;

        let body: JobStatusResponse = response.json().await.map_err(|e| {
            CrawlAdminError::Serialization(format!("无法解析任务 {job_id} 的状态响应: {e}"))
        })?;
        debug!("任务 {} 状态: {}", job_id, body.status);
        body.status.parse()
    }

    async fn stop_job(&self, job_id: &str) -> CrawlAdminResult<()> {
        let url = self.endpoint(&["jobs", job_id, "stop"]);
        let response = self
            .http_client
            .post(url)
            .send()
            .await
            .map_err(transport_error)?;
        Self::check_response(response, job_id).await?;

        info!("已通知爬虫引擎停止任务 {}", job_id);
        Ok(())
    }

    fn name(&self) -> &str {
        BACKEND
    }
}
