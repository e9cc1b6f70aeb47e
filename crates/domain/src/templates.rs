//! 任务模板渲染
//!
//! 五种内置模板对应爬虫引擎常用的抓取方式。模板文本中的 `{{ name }}`
//! 占位符会被替换为JSON字面量，JSON是合法的YAML流式语法，
//! 所以种子里的空格、引号、冒号都不会破坏生成的文档。
//!
//! 可用的占位符：`job_id`、`crawl_request_name`、`crawl_request_prefix`、
//! `seeds`、`ignore_robots`。

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crawl_admin_core::{CrawlAdminError, CrawlAdminResult, JobConfig, TemplateConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobTemplate {
    SinglePage,
    DomainCrawl,
    SocialMedia,
    OneHopDaily,
    OneHopOff,
}

impl JobTemplate {
    pub fn all() -> [JobTemplate; 5] {
        [
            JobTemplate::SinglePage,
            JobTemplate::DomainCrawl,
            JobTemplate::SocialMedia,
            JobTemplate::OneHopDaily,
            JobTemplate::OneHopOff,
        ]
    }

    pub fn code(&self) -> char {
        match self {
            JobTemplate::SinglePage => '1',
            JobTemplate::DomainCrawl => '2',
            JobTemplate::SocialMedia => '3',
            JobTemplate::OneHopDaily => '4',
            JobTemplate::OneHopOff => '5',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            JobTemplate::SinglePage => "single-page",
            JobTemplate::DomainCrawl => "domain-crawl",
            JobTemplate::SocialMedia => "social-media",
            JobTemplate::OneHopDaily => "one-hop-daily",
            JobTemplate::OneHopOff => "one-hop-off",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            JobTemplate::SinglePage => "只抓取种子页面",
            JobTemplate::DomainCrawl => "抓取种子所在站点的全部页面",
            JobTemplate::SocialMedia => "社交媒体账号页面，包含滚动行为",
            JobTemplate::OneHopDaily => "种子页面及直接链接，适合每日运行",
            JobTemplate::OneHopOff => "站内页面加站外一跳",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            JobTemplate::SinglePage => "template_single_page_crawl.yaml",
            JobTemplate::DomainCrawl => "template_domain_crawl.yaml",
            JobTemplate::SocialMedia => "template_twitter_crawl.yaml",
            JobTemplate::OneHopDaily => "template_1_hop_daily_crawl.yaml",
            JobTemplate::OneHopOff => "template_1_hopoff_crawl.yaml",
        }
    }

    fn embedded(&self) -> &'static str {
        match self {
            JobTemplate::SinglePage => include_str!("../templates/template_single_page_crawl.yaml"),
            JobTemplate::DomainCrawl => include_str!("../templates/template_domain_crawl.yaml"),
            JobTemplate::SocialMedia => include_str!("../templates/template_twitter_crawl.yaml"),
            JobTemplate::OneHopDaily => {
                include_str!("../templates/template_1_hop_daily_crawl.yaml")
            }
            JobTemplate::OneHopOff => include_str!("../templates/template_1_hopoff_crawl.yaml"),
        }
    }

    pub fn requires_seeds(&self) -> bool {
        matches!(self, JobTemplate::SinglePage)
    }
}

impl fmt::Display for JobTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for JobTemplate {
    type Err = CrawlAdminError;

    /// 接受模板名称或编号，编号只看第一个字符（表单值形如 `"1 - 单页面"`）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if let Some(template) = JobTemplate::all().into_iter().find(|t| t.name() == value) {
            return Ok(template);
        }

        value
            .chars()
            .next()
            .and_then(|first| JobTemplate::all().into_iter().find(|t| t.code() == first))
            .ok_or_else(|| CrawlAdminError::UnknownTemplate(s.to_string()))
    }
}

/// 渲染参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobTemplateParams {
    pub job_id: String,
    pub crawl_request_name: String,
    /// 为空时使用爬取请求名称
    #[serde(default)]
    pub warc_prefix: String,
    #[serde(default)]
    pub seeds: Vec<String>,
    #[serde(default)]
    pub ignore_robots: bool,
}

impl JobTemplateParams {
    fn effective_prefix(&self) -> &str {
        if self.warc_prefix.trim().is_empty() {
            &self.crawl_request_name
        } else {
            self.warc_prefix.trim()
        }
    }

    fn validate(&self, template: JobTemplate) -> CrawlAdminResult<()> {
        check_token("任务ID", &self.job_id)?;
        check_token("爬取请求名称", &self.crawl_request_name)?;

        let prefix = self.effective_prefix();
        if !prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(CrawlAdminError::invalid_params(format!(
                "warc前缀只能包含字母、数字、'.'、'_'和'-': {prefix}"
            )));
        }

        if template.requires_seeds() && self.seeds.is_empty() {
            return Err(CrawlAdminError::invalid_params(format!(
                "{template} 模板至少需要一个种子URL"
            )));
        }
        Ok(())
    }
}

fn check_token(field: &str, value: &str) -> CrawlAdminResult<()> {
    if value.is_empty() {
        return Err(CrawlAdminError::invalid_params(format!("{field}不能为空")));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(CrawlAdminError::invalid_params(format!(
            "{field}不能包含空白字符: {value:?}"
        )));
    }
    Ok(())
}

/// 模板渲染器，未配置目录时使用编译进二进制的内置模板
#[derive(Debug, Clone, Default)]
pub struct TemplateRenderer {
    directory: Option<PathBuf>,
}

impl TemplateRenderer {
    pub fn embedded() -> Self {
        Self { directory: None }
    }

    pub fn with_directory<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: Some(directory.into()),
        }
    }

    pub fn from_config(config: &TemplateConfig) -> Self {
        match &config.directory {
            Some(dir) => Self::with_directory(dir),
            None => Self::embedded(),
        }
    }

    /// 读取模板原文
    pub fn load(&self, template: JobTemplate) -> CrawlAdminResult<Cow<'static, str>> {
        let Some(dir) = &self.directory else {
            return Ok(Cow::Borrowed(template.embedded()));
        };

        let path = dir.join(template.file_name());
        debug!("读取任务模板: {}", path.display());
        std::fs::read_to_string(&path)
            .map(Cow::Owned)
            .map_err(|e| CrawlAdminError::TemplateLoad {
                template: template.name().to_string(),
                message: format!("{}: {e}", path.display()),
            })
    }

    /// 生成任务ID之前的预检，与 `render` 的校验和渲染过程相同，只是不返回文本
    pub fn check(&self, template: JobTemplate, params: &JobTemplateParams) -> CrawlAdminResult<()> {
        self.render(template, params).map(|_| ())
    }

    /// 渲染任务配置文本，结果保证能被 `JobConfig::parse` 解析
    pub fn render(&self, template: JobTemplate, params: &JobTemplateParams) -> CrawlAdminResult<String> {
        params.validate(template)?;

        let text = self.load(template)?;
        let rendered = substitute(template, &text, params)?;

        JobConfig::parse(&rendered).map_err(|e| CrawlAdminError::TemplateLoad {
            template: template.name().to_string(),
            message: format!("渲染结果无法解析: {e}"),
        })?;

        Ok(rendered)
    }
}

fn placeholder_value(key: &str, params: &JobTemplateParams) -> CrawlAdminResult<Option<String>> {
    let value = match key {
        "job_id" => serde_json::to_string(&params.job_id)?,
        "crawl_request_name" => serde_json::to_string(&params.crawl_request_name)?,
        "crawl_request_prefix" => serde_json::to_string(params.effective_prefix())?,
        "ignore_robots" => params.ignore_robots.to_string(),
        "seeds" => {
            let seeds = params
                .seeds
                .iter()
                .map(|url| serde_json::to_string(url).map(|url| format!("{{\"url\": {url}}}")))
                .collect::<Result<Vec<_>, _>>()?;
            format!("[{}]", seeds.join(", "))
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn substitute(
    template: JobTemplate,
    text: &str,
    params: &JobTemplateParams,
) -> CrawlAdminResult<String> {
    let load_error = |message: String| CrawlAdminError::TemplateLoad {
        template: template.name().to_string(),
        message,
    };

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| load_error("占位符缺少结束的 '}}'".to_string()))?;

        let key = after[..end].trim();
        let value = placeholder_value(key, params)?
            .ok_or_else(|| load_error(format!("未知的占位符: {key}")))?;
        out.push_str(&value);

        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn params(seeds: &[&str]) -> JobTemplateParams {
        JobTemplateParams {
            job_id: "example-site-1".to_string(),
            crawl_request_name: "example-site".to_string(),
            warc_prefix: String::new(),
            seeds: seeds.iter().map(|s| s.to_string()).collect(),
            ignore_robots: false,
        }
    }

    #[test]
    fn test_parse_by_code_and_name() {
        assert_eq!("2".parse::<JobTemplate>().unwrap(), JobTemplate::DomainCrawl);
        assert_eq!(
            "4 - one hop daily".parse::<JobTemplate>().unwrap(),
            JobTemplate::OneHopDaily
        );
        assert_eq!(
            "one-hop-off".parse::<JobTemplate>().unwrap(),
            JobTemplate::OneHopOff
        );
        assert!(matches!(
            "9".parse::<JobTemplate>(),
            Err(CrawlAdminError::UnknownTemplate(_))
        ));
        assert!("".parse::<JobTemplate>().is_err());
    }

    #[test]
    fn test_domain_crawl_render() {
        let renderer = TemplateRenderer::embedded();
        let text = renderer
            .render(JobTemplate::DomainCrawl, &params(&["http://a.example"]))
            .unwrap();

        let config = JobConfig::parse(&text).unwrap();
        assert_eq!(config.id(), Some("example-site-1"));
        assert_eq!(config.seeds(), vec!["http://a.example"]);
        assert_eq!(config.warc_prefix(), Some("example-site"));
        assert!(!config.ignore_robots());
    }

    #[test]
    fn test_every_template_round_trips() {
        let renderer = TemplateRenderer::embedded();
        let mut p = params(&["http://a.example", "https://b.example:8443"]);
        p.warc_prefix = "custom.prefix_1".to_string();
        p.ignore_robots = true;

        for template in JobTemplate::all() {
            let text = renderer.render(template, &p).unwrap();
            let config = JobConfig::parse(&text).unwrap();
            assert_eq!(config.id(), Some("example-site-1"), "{template}");
            assert_eq!(config.seeds(), p.seeds, "{template}");
            assert_eq!(config.warc_prefix(), Some("custom.prefix_1"), "{template}");
            assert!(config.ignore_robots(), "{template}");
        }
    }

    #[test]
    fn test_awkward_seeds_stay_literal() {
        let renderer = TemplateRenderer::embedded();
        let seeds = ["http://a.example/a b", "http://b.example/?q=\"x\": y", "#not-a-comment"];
        let text = renderer
            .render(JobTemplate::DomainCrawl, &params(&seeds))
            .unwrap();

        let config = JobConfig::parse(&text).unwrap();
        assert_eq!(config.seeds(), seeds);
    }

    #[test]
    fn test_zero_seeds() {
        let renderer = TemplateRenderer::embedded();
        let text = renderer.render(JobTemplate::OneHopOff, &params(&[])).unwrap();
        assert!(JobConfig::parse(&text).unwrap().seeds().is_empty());

        assert!(matches!(
            renderer.render(JobTemplate::SinglePage, &params(&[])),
            Err(CrawlAdminError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_invalid_parameters() {
        let renderer = TemplateRenderer::embedded();

        let mut p = params(&["http://a.example"]);
        p.job_id = "bad id".to_string();
        assert!(matches!(
            renderer.render(JobTemplate::DomainCrawl, &p),
            Err(CrawlAdminError::InvalidParameters(_))
        ));

        let mut p = params(&["http://a.example"]);
        p.warc_prefix = "a/b".to_string();
        assert!(matches!(
            renderer.render(JobTemplate::DomainCrawl, &p),
            Err(CrawlAdminError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_directory_templates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(JobTemplate::SinglePage.file_name()),
            "id: {{ job_id }}\nseeds: {{seeds}}\n",
        )
        .unwrap();
        fs::write(
            dir.path().join(JobTemplate::DomainCrawl.file_name()),
            "id: {{ job_id }}\nowner: {{ operator }}\n",
        )
        .unwrap();
        fs::write(
            dir.path().join(JobTemplate::SocialMedia.file_name()),
            "id: {{ job_id\n",
        )
        .unwrap();

        let renderer = TemplateRenderer::with_directory(dir.path());
        let p = params(&["http://a.example"]);

        let text = renderer.render(JobTemplate::SinglePage, &p).unwrap();
        assert_eq!(JobConfig::parse(&text).unwrap().seeds(), vec!["http://a.example"]);

        for template in [
            JobTemplate::DomainCrawl,
            JobTemplate::SocialMedia,
            JobTemplate::OneHopOff,
        ] {
            assert!(matches!(
                renderer.render(template, &p),
                Err(CrawlAdminError::TemplateLoad { .. })
            ));
        }
    }
}
