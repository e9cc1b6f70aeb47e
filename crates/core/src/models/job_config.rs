//! 任务配置文档
//!
//! 爬虫引擎使用YAML格式的任务配置，顶层至少包含以下字段：
//!
//! ```yaml
//! id: example-site-1
//! ignore_robots: false
//! warcprox_meta:
//!   warc-prefix: example-site
//! seeds:
//!   - url: http://a.example
//! ```

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::{CrawlAdminError, CrawlAdminResult};

const ID_KEY: &str = "id";
const SEEDS_KEY: &str = "seeds";
const WARCPROX_META_KEY: &str = "warcprox_meta";
const WARC_PREFIX_KEY: &str = "warc-prefix";
const IGNORE_ROBOTS_KEY: &str = "ignore_robots";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobConfig(Mapping);

impl JobConfig {
    /// 解析配置文本，顶层必须是映射
    pub fn parse(text: &str) -> CrawlAdminResult<Self> {
        let value: Value = serde_yaml::from_str(text).map_err(|e| {
            CrawlAdminError::invalid_params(format!("任务配置不是有效的YAML: {e}"))
        })?;

        match value {
            Value::Mapping(mapping) => Ok(Self(mapping)),
            Value::Null => Err(CrawlAdminError::invalid_params("任务配置不能为空")),
            _ => Err(CrawlAdminError::invalid_params(
                "任务配置的顶层必须是键值映射",
            )),
        }
    }

    pub fn from_mapping(mapping: Mapping) -> Self {
        Self(mapping)
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.0
    }

    pub fn to_yaml(&self) -> CrawlAdminResult<String> {
        Ok(serde_yaml::to_string(&self.0)?)
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_KEY).and_then(Value::as_str)
    }

    pub fn set_id(&mut self, job_id: &str) {
        self.0
            .insert(Value::from(ID_KEY), Value::from(job_id.to_string()));
    }

    /// 补全缺失的 `id`，已有的 `id` 必须与任务ID一致
    pub fn ensure_id(&mut self, job_id: &str) -> CrawlAdminResult<()> {
        match self.0.get(ID_KEY) {
            None | Some(Value::Null) => {
                self.set_id(job_id);
                Ok(())
            }
            Some(Value::String(existing)) if existing == job_id => Ok(()),
            Some(other) => Err(CrawlAdminError::invalid_params(format!(
                "任务配置中的id {other:?} 与任务ID {job_id} 不一致"
            ))),
        }
    }

    /// 种子URL列表，同时接受 `- url: ...` 和 `- ...` 两种写法
    pub fn seeds(&self) -> Vec<String> {
        let Some(Value::Sequence(seeds)) = self.0.get(SEEDS_KEY) else {
            return Vec::new();
        };

        seeds
            .iter()
            .filter_map(|seed| match seed {
                Value::String(url) => Some(url.clone()),
                Value::Mapping(m) => m.get("url").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect()
    }

    pub fn warc_prefix(&self) -> Option<&str> {
        self.0
            .get(WARCPROX_META_KEY)
            .and_then(|meta| meta.get(WARC_PREFIX_KEY))
            .and_then(Value::as_str)
    }

    pub fn ignore_robots(&self) -> bool {
        self.0
            .get(IGNORE_ROBOTS_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
id: example-site-1
ignore_robots: true
warcprox_meta:
  warc-prefix: example
seeds:
  - url: http://a.example
  - http://b.example
"#;

    #[test]
    fn test_parse_required_fields() {
        let config = JobConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.id(), Some("example-site-1"));
        assert!(config.ignore_robots());
        assert_eq!(config.warc_prefix(), Some("example"));
        assert_eq!(config.seeds(), vec!["http://a.example", "http://b.example"]);
    }

    #[test]
    fn test_parse_rejects_non_mapping() {
        assert!(matches!(
            JobConfig::parse("- a\n- b\n"),
            Err(CrawlAdminError::InvalidParameters(_))
        ));
        assert!(matches!(
            JobConfig::parse(""),
            Err(CrawlAdminError::InvalidParameters(_))
        ));
        assert!(matches!(
            JobConfig::parse("id: [unclosed"),
            Err(CrawlAdminError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_ensure_id() {
        let mut config = JobConfig::parse("seeds: []\n").unwrap();
        config.ensure_id("site-3").unwrap();
        assert_eq!(config.id(), Some("site-3"));

        config.ensure_id("site-3").unwrap();
        assert!(config.ensure_id("site-4").is_err());
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = JobConfig::parse(SAMPLE).unwrap();
        let text = config.to_yaml().unwrap();
        assert_eq!(JobConfig::parse(&text).unwrap(), config);
    }

    #[test]
    fn test_missing_optional_fields() {
        let config = JobConfig::parse("id: x\n").unwrap();
        assert!(config.seeds().is_empty());
        assert_eq!(config.warc_prefix(), None);
        assert!(!config.ignore_robots());
    }
}
