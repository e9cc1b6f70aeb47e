pub mod crawl_engine;
pub mod database;
pub mod in_memory_store;
pub mod observability;

pub use crawl_engine::{HttpCrawlEngine, InMemoryCrawlEngine};
pub use database::SqliteJobStore;
pub use in_memory_store::InMemoryJobStore;
pub use observability::{init_metrics, MetricsCollector, StructuredLogger};
