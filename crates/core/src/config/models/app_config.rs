use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    api::ApiConfig, crawl_engine::CrawlEngineConfig, database::DatabaseConfig,
    scheduler::SchedulerConfig, templates::TemplateConfig,
};

/// 指向替代配置文件的环境变量
pub const CONFIGURATION_ENV_VAR: &str = "CRAWL_ADMIN_CONFIGURATION";

const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "config/crawl-admin.toml",
    "crawl-admin.toml",
    "/etc/crawl-admin/config.toml",
];

/// System configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub crawl_engine: CrawlEngineConfig,
    pub scheduler: SchedulerConfig,
    pub api: ApiConfig,
    pub templates: TemplateConfig,
}

impl AppConfig {
    /// Load configuration from config file and environment variables
    ///
    /// `config_path` - Config file path, if None use default paths
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let override_path = std::env::var(CONFIGURATION_ENV_VAR).ok();
        Self::load_with(config_path, override_path.as_deref())
    }

    /// Load configuration with an explicit override file instead of reading
    /// `CRAWL_ADMIN_CONFIGURATION`
    pub fn load_with(config_path: Option<&str>, override_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        // 1. Base config file
        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        } else if let Some(path) = DEFAULT_CONFIG_PATHS
            .iter()
            .find(|path| Path::new(path).exists())
        {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        // 2. Alternate config file named by the environment
        if let Some(path) = override_path {
            if !Path::new(path).exists() {
                return Err(anyhow::anyhow!(
                    "{} 指定的配置文件不存在: {}",
                    CONFIGURATION_ENV_VAR,
                    path
                ));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        // 3. Environment variable overrides - highest priority
        builder = builder.add_source(
            Environment::with_prefix("CRAWL_ADMIN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }

    pub fn validate(&self) -> Result<()> {
        self.database.validate().context("数据库配置验证失败")?;
        self.crawl_engine
            .validate()
            .context("爬虫引擎配置验证失败")?;
        self.scheduler.validate().context("定时任务配置验证失败")?;
        self.api.validate().context("API配置验证失败")?;
        self.templates.validate().context("模板配置验证失败")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_toml(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.bind_address(), "localhost:5001");
        assert_eq!(config.crawl_engine.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = AppConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.database.url, config.database.url);
        assert_eq!(parsed.crawl_engine.port, config.crawl_engine.port);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_toml(
            r#"
[crawl_engine]
host = "engine.internal"
port = 9000
"#,
        );
        let config = AppConfig::load_with(file.path().to_str(), None).unwrap();
        assert_eq!(config.crawl_engine.host, "engine.internal");
        assert_eq!(config.crawl_engine.port, 9000);
        assert_eq!(config.database.crawl_requests_table, "crawl_requests");
    }

    #[test]
    fn test_override_file_wins_over_base_file() {
        let base = write_toml(
            r#"
[database]
url = "sqlite://base.db"
crawl_requests_table = "base_requests"
"#,
        );
        let alternate = write_toml(
            r#"
[database]
url = "sqlite://alternate.db"
"#,
        );
        let config =
            AppConfig::load_with(base.path().to_str(), alternate.path().to_str()).unwrap();
        assert_eq!(config.database.url, "sqlite://alternate.db");
        assert_eq!(config.database.crawl_requests_table, "base_requests");
    }

    #[test]
    fn test_missing_files_are_errors() {
        assert!(AppConfig::load_with(Some("/nonexistent/crawl-admin.toml"), None).is_err());

        let base = write_toml("");
        assert!(
            AppConfig::load_with(base.path().to_str(), Some("/nonexistent/override.toml"))
                .is_err()
        );
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let result = AppConfig::from_toml(
            r#"
[scheduler]
tick_interval_seconds = 120
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_sample_config_file() {
        let config =
            AppConfig::from_toml(include_str!("../../../../../config/crawl-admin.toml")).unwrap();
        assert_eq!(config.database.crawl_requests_table, "crawl_requests");
        assert_eq!(config.crawl_engine.status_retry.max_attempts, 3);
        assert!(config.templates.directory.is_none());
    }
}
