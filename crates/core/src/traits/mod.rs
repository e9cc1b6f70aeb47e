pub mod crawl_engine;
pub mod repository;

pub use crawl_engine::*;
pub use repository::*;
