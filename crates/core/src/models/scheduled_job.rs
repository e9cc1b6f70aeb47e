use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CrawlAdminError, CrawlAdminResult};

/// 每日定时启动的任务
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledJob {
    pub id: String,
    pub crawl_request_name: String,
    pub job_name: String,
    /// 未渲染的任务配置，每次触发时替换 `id`
    pub job_config_template: String,
    pub hour: u32,
    pub minute: u32,
    pub state: ScheduleState,
    pub last_fired_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScheduleState {
    #[serde(rename = "REGISTERED")]
    Registered,
    #[serde(rename = "CANCELLED")]
    Cancelled,
}

impl ScheduleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleState::Registered => "REGISTERED",
            ScheduleState::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> CrawlAdminResult<Self> {
        match s {
            "REGISTERED" => Ok(ScheduleState::Registered),
            "CANCELLED" => Ok(ScheduleState::Cancelled),
            _ => Err(CrawlAdminError::Serialization(format!(
                "Invalid schedule state: {s}"
            ))),
        }
    }
}

/// 定时任务的唯一键，同一爬取请求下不允许重复
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScheduleKey {
    pub crawl_request_name: String,
    pub job_name: String,
    pub hour: u32,
    pub minute: u32,
}

impl ScheduledJob {
    pub fn new(
        id: String,
        crawl_request_name: String,
        job_name: String,
        job_config_template: String,
        hour: u32,
        minute: u32,
    ) -> Self {
        Self {
            id,
            crawl_request_name,
            job_name,
            job_config_template,
            hour,
            minute,
            state: ScheduleState::Registered,
            last_fired_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn validate_time(hour: u32, minute: u32) -> CrawlAdminResult<()> {
        if hour > 23 {
            return Err(CrawlAdminError::invalid_params(format!(
                "小时必须在0-23之间: {hour}"
            )));
        }
        if minute > 59 {
            return Err(CrawlAdminError::invalid_params(format!(
                "分钟必须在0-59之间: {minute}"
            )));
        }
        Ok(())
    }

    pub fn key(&self) -> ScheduleKey {
        ScheduleKey {
            crawl_request_name: self.crawl_request_name.clone(),
            job_name: self.job_name.clone(),
            hour: self.hour,
            minute: self.minute,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.state == ScheduleState::Registered
    }

    /// 六段式CRON表达式（秒 分 时 日 月 周）
    pub fn cron_expression(&self) -> String {
        format!("0 {} {} * * *", self.minute, self.hour)
    }
}
