//! 爬虫引擎客户端
//!
//! - `HttpCrawlEngine` - 通过HTTP接口访问外部爬虫引擎
//! - `InMemoryCrawlEngine` - 嵌入式模式使用，只记录任务状态不执行抓取

pub mod http_crawl_engine;
pub mod in_memory_crawl_engine;

pub use http_crawl_engine::HttpCrawlEngine;
pub use in_memory_crawl_engine::InMemoryCrawlEngine;
