//! 种子URL规范化
//!
//! 每个站点只保留一个种子。站点按 origin 划分：`scheme://host[:port]`，
//! 主机名小写，默认端口省略，不带结尾斜杠。
//!
//! - 没有协议的URL（`example.com/page`）按 `http://` 补全后再解析
//! - 只接受 http 和 https
//! - 任何一条无法解析的URL都会让整批失败，错误中给出该条URL

use std::collections::BTreeSet;

use url::Url;

use crawl_admin_core::{CrawlAdminError, CrawlAdminResult};

pub struct SeedNormalizer;

impl SeedNormalizer {
    pub fn normalize<S: AsRef<str>>(urls: &[S]) -> CrawlAdminResult<BTreeSet<String>> {
        let mut seeds = BTreeSet::new();
        for raw in urls {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            seeds.insert(Self::canonical_site(raw)?);
        }
        Ok(seeds)
    }

    /// 单个URL对应的站点种子
    pub fn canonical_site(raw: &str) -> CrawlAdminResult<String> {
        let url = Self::parse(raw)?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(CrawlAdminError::InvalidUrl {
                    url: raw.to_string(),
                    reason: format!("不支持的协议: {other}"),
                })
            }
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(CrawlAdminError::InvalidUrl {
                url: raw.to_string(),
                reason: "缺少主机名".to_string(),
            });
        }

        Ok(url.origin().ascii_serialization())
    }

    fn parse(raw: &str) -> CrawlAdminResult<Url> {
        match Url::parse(raw) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("http://{raw}"))
                .map_err(|e| CrawlAdminError::InvalidUrl {
                    url: raw.to_string(),
                    reason: e.to_string(),
                }),
            Err(e) => Err(CrawlAdminError::InvalidUrl {
                url: raw.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let seeds = SeedNormalizer::normalize::<&str>(&[]).unwrap();
        assert!(seeds.is_empty());
    }

    #[test]
    fn test_same_host_collapses_to_one_seed() {
        let seeds =
            SeedNormalizer::normalize(&["http://a.example", "http://a.example/page2"]).unwrap();
        assert_eq!(seeds.into_iter().collect::<Vec<_>>(), vec!["http://a.example"]);
    }

    #[test]
    fn test_canonicalization() {
        let seeds = SeedNormalizer::normalize(&[
            "HTTP://A.Example:80/x?y=1#frag",
            "http://a.example/",
            "https://a.example/secure",
            "http://a.example:8080/alt",
            "b.example/path",
            "  ",
        ])
        .unwrap();

        let seeds: Vec<_> = seeds.into_iter().collect();
        assert_eq!(
            seeds,
            vec![
                "http://a.example",
                "http://a.example:8080",
                "http://b.example",
                "https://a.example",
            ]
        );
    }

    #[test]
    fn test_distinct_subdomains_are_distinct_sites() {
        let seeds =
            SeedNormalizer::normalize(&["http://www.a.example/", "http://a.example/"]).unwrap();
        assert_eq!(seeds.len(), 2);
    }

    #[test]
    fn test_malformed_url_names_offending_entry() {
        let err = SeedNormalizer::normalize(&["http://ok.example", "http://exa mple.com"])
            .unwrap_err();
        match err {
            CrawlAdminError::InvalidUrl { url, .. } => assert_eq!(url, "http://exa mple.com"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_scheme_rejected() {
        assert!(matches!(
            SeedNormalizer::normalize(&["ftp://files.example/pub"]),
            Err(CrawlAdminError::InvalidUrl { .. })
        ));
        assert!(matches!(
            SeedNormalizer::normalize(&["mailto:someone@example.com"]),
            Err(CrawlAdminError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_normalize_is_a_fixed_point() {
        let input = [
            "http://a.example/1",
            "http://a.example/2",
            "https://b.example/x",
            "c.example",
        ];
        let once = SeedNormalizer::normalize(&input).unwrap();
        let again: Vec<&str> = once.iter().map(String::as_str).collect();
        let twice = SeedNormalizer::normalize(&again).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_every_input_site_is_represented_once() {
        let input = [
            "http://a.example/1",
            "http://b.example/2",
            "http://a.example/3",
            "http://b.example/4",
            "http://c.example",
        ];
        let seeds = SeedNormalizer::normalize(&input).unwrap();
        for raw in input {
            let site = SeedNormalizer::canonical_site(raw).unwrap();
            assert_eq!(seeds.iter().filter(|s| **s == site).count(), 1);
        }
        assert_eq!(seeds.len(), 3);
    }
}
