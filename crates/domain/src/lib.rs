pub mod gateway;
pub mod seeds;
pub mod templates;

pub use gateway::{CrawlRequestOverview, JobStatusView, JobStoreGateway};
pub use seeds::SeedNormalizer;
pub use templates::{JobTemplate, JobTemplateParams, TemplateRenderer};
