use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CrawlAdminError, CrawlAdminResult};

/// 爬取请求：运维人员命名的一组相关任务
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrawlRequest {
    pub name: String,
    /// 按创建顺序排列的任务ID
    pub job_list: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl CrawlRequest {
    pub fn new(name: String) -> Self {
        Self {
            name,
            job_list: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// 校验爬取请求名称，名称会出现在任务ID中，不允许空白字符
    pub fn validate_name(name: &str) -> CrawlAdminResult<()> {
        if name.trim().is_empty() {
            return Err(CrawlAdminError::invalid_params("爬取请求名称不能为空"));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(CrawlAdminError::invalid_params(format!(
                "爬取请求名称不能包含空白字符: {name:?}"
            )));
        }
        Ok(())
    }

    pub fn last_job_id(&self) -> Option<&str> {
        self.job_list.last().map(String::as_str)
    }
}
