pub mod crawl_requests;
pub mod health;
pub mod jobs;
pub mod metrics;
pub mod schedules;
pub mod templates;
