use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// 爬虫引擎连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlEngineConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
    /// 状态查询的重试策略
    pub status_retry: RetryPolicy,
}

impl Default for CrawlEngineConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "localhost".to_string(),
            port: 8000,
            request_timeout_seconds: 30,
            status_retry: RetryPolicy::default(),
        }
    }
}

impl CrawlEngineConfig {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.scheme != "http" && self.scheme != "https" {
            return Err(anyhow::anyhow!("爬虫引擎协议必须是http或https: {}", self.scheme));
        }
        if self.host.is_empty() {
            return Err(anyhow::anyhow!("爬虫引擎主机不能为空"));
        }
        if self.port == 0 {
            return Err(anyhow::anyhow!("爬虫引擎端口必须大于0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("请求超时时间必须大于0"));
        }
        self.status_retry.validate()?;
        Ok(())
    }
}
