use anyhow::Result;
use metrics::{counter, gauge, Counter, Gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// 安装全局Prometheus记录器，返回用于渲染 `/metrics` 的句柄
///
/// 必须在创建 `MetricsCollector` 之前调用，否则指标不会被记录。
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("安装Prometheus指标记录器失败: {}", e))?;

    info!("Prometheus指标记录器已安装");
    Ok(handle)
}

/// 控制台业务指标
#[derive(Clone)]
pub struct MetricsCollector {
    jobs_launched_total: Counter,
    partial_launches_total: Counter,
    bulk_urls_lost_total: Counter,
    jobs_stopped_total: Counter,
    schedule_firings_total: Counter,
    schedule_failures_total: Counter,
    registered_schedules: Gauge,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            jobs_launched_total: counter!("crawl_admin_jobs_launched_total"),
            partial_launches_total: counter!("crawl_admin_partial_launches_total"),
            bulk_urls_lost_total: counter!("crawl_admin_bulk_urls_lost_total"),
            jobs_stopped_total: counter!("crawl_admin_jobs_stopped_total"),
            schedule_firings_total: counter!("crawl_admin_schedule_firings_total"),
            schedule_failures_total: counter!("crawl_admin_schedule_failures_total"),
            registered_schedules: gauge!("crawl_admin_registered_schedules"),
        }
    }

    pub fn record_job_launched(&self) {
        self.jobs_launched_total.increment(1);
    }

    pub fn record_partial_launch(&self) {
        self.partial_launches_total.increment(1);
    }

    pub fn record_bulk_urls_lost(&self) {
        self.bulk_urls_lost_total.increment(1);
    }

    pub fn record_job_stopped(&self) {
        self.jobs_stopped_total.increment(1);
    }

    pub fn record_schedule_fired(&self, success: bool) {
        if success {
            self.schedule_firings_total.increment(1);
        } else {
            self.schedule_failures_total.increment(1);
        }
    }

    pub fn set_registered_schedules(&self, count: usize) {
        self.registered_schedules.set(count as f64);
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
