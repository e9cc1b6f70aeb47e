//! 可观测性
//!
//! - 结构化日志事件（`event` 字段标识事件类型）
//! - Prometheus指标

pub mod metrics_collector;
pub mod structured_logger;

pub use metrics_collector::{init_metrics, MetricsCollector};
pub use structured_logger::StructuredLogger;
