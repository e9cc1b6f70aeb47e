use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use crawl_admin_dispatcher::TemplateJobRequest;
use crawl_admin_domain::JobTemplate;
use crawl_admin_infrastructure::StructuredLogger;
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiResult,
    extract::ApiJson,
    response::{created, success},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateCrawlRequest {
    pub name: String,
}

/// 种子既可以是空白分隔的文本，也可以是列表
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SeedInput {
    Text(String),
    List(Vec<String>),
}

impl Default for SeedInput {
    fn default() -> Self {
        SeedInput::List(Vec::new())
    }
}

impl SeedInput {
    pub fn into_urls(self) -> Vec<String> {
        match self {
            SeedInput::Text(text) => text.split_whitespace().map(str::to_string).collect(),
            SeedInput::List(list) => list,
        }
    }
}

/// 模板任务请求，`job_type` 接受模板名称或单字符代码
#[derive(Debug, Deserialize)]
pub struct LaunchTemplateJob {
    pub job_type: String,
    #[serde(default)]
    pub seeds: SeedInput,
    #[serde(default)]
    pub warc_prefix: String,
    #[serde(default)]
    pub ignore_robots: bool,
    #[serde(default)]
    pub bulk_urls: bool,
}

#[derive(Debug, Deserialize)]
pub struct LaunchCustomJob {
    pub job_name: String,
    pub job_config: String,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleJobRequest {
    pub job_name: String,
    pub job_config: String,
    pub hour: u32,
    pub minute: u32,
}

#[derive(Debug, Serialize)]
pub struct LastConfig {
    pub crawl_request: String,
    /// 预填的YAML配置，还没有任务时为空
    pub config: Option<String>,
}

/// 所有爬取请求及其任务状态
pub async fn list_crawl_requests(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let overview = state.gateway.crawl_request_overview().await?;
    Ok(success(overview))
}

pub async fn create_crawl_request(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateCrawlRequest>,
) -> ApiResult<impl IntoResponse> {
    let crawl_request = state.gateway.create_crawl_request(&request.name).await?;
    StructuredLogger::log_crawl_request_created(&crawl_request.name);
    Ok(created(crawl_request))
}

/// 上一次的任务配置，`id` 已替换为新的任务ID
pub async fn get_last_config(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let config = match state.launcher.prefill_job_config(&name).await? {
        Some(config) => Some(config.to_yaml()?),
        None => None,
    };
    Ok(success(LastConfig {
        crawl_request: name,
        config,
    }))
}

pub async fn launch_template_job(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ApiJson(request): ApiJson<LaunchTemplateJob>,
) -> ApiResult<impl IntoResponse> {
    let template: JobTemplate = request.job_type.parse()?;
    let request = TemplateJobRequest {
        template,
        seeds: request.seeds.into_urls(),
        warc_prefix: request.warc_prefix,
        ignore_robots: request.ignore_robots,
        bulk_urls: request.bulk_urls,
    };

    let launched = state.launcher.launch_template_job(&name, &request).await?;
    Ok(created(launched))
}

pub async fn launch_custom_job(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ApiJson(request): ApiJson<LaunchCustomJob>,
) -> ApiResult<impl IntoResponse> {
    let launched = state
        .launcher
        .launch_job(&name, request.job_name.trim(), &request.job_config)
        .await?;
    Ok(created(launched))
}

pub async fn schedule_job(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ApiJson(request): ApiJson<ScheduleJobRequest>,
) -> ApiResult<impl IntoResponse> {
    let schedule = state
        .launcher
        .launch_scheduled_job(
            &state.bridge,
            &name,
            &request.job_name,
            &request.job_config,
            request.hour,
            request.minute,
        )
        .await?;
    Ok(created(schedule))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_input_accepts_text_and_list() {
        let text: SeedInput =
            serde_json::from_str("\"http://a.example\n  http://b.example \"").unwrap();
        assert_eq!(
            text.into_urls(),
            vec!["http://a.example".to_string(), "http://b.example".to_string()]
        );

        let list: SeedInput = serde_json::from_str("[\"http://a.example\"]").unwrap();
        assert_eq!(list.into_urls(), vec!["http://a.example".to_string()]);
    }

    #[test]
    fn test_template_job_defaults() {
        let request: LaunchTemplateJob = serde_json::from_str(r#"{"job_type": "2"}"#).unwrap();
        assert!(request.seeds.into_urls().is_empty());
        assert!(!request.bulk_urls);
        assert!(request.warc_prefix.is_empty());
    }
}
