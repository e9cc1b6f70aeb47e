use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use crawl_admin_api::{create_app, AppState};
use crawl_admin_core::{AppConfig, CrawlEngine, JobRepository, ScheduleRepository};
use crawl_admin_dispatcher::{JobLauncher, ScheduleBridge};
use crawl_admin_domain::{JobStoreGateway, TemplateRenderer};
use crawl_admin_infrastructure::{
    init_metrics, HttpCrawlEngine, InMemoryCrawlEngine, InMemoryJobStore, MetricsCollector,
    SqliteJobStore,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{error, info, warn};

/// 存储和爬虫引擎的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// SQLite存储 + HTTP爬虫引擎
    Standard,
    /// 内存存储 + 内存爬虫引擎，用于本地试用
    Embedded,
}

/// 主应用程序
pub struct Application {
    config: AppConfig,
    mode: AppMode,
    sqlite: Option<SqliteJobStore>,
    gateway: Arc<JobStoreGateway>,
    launcher: Arc<JobLauncher>,
    bridge: Arc<ScheduleBridge>,
    metrics_handle: Option<PrometheusHandle>,
}

impl Application {
    pub async fn new(config: AppConfig, mode: AppMode) -> Result<Self> {
        Self::build(config, mode, true).await
    }

    /// 不安装全局指标记录器，测试中多次构建应用时使用
    pub async fn without_metrics(config: AppConfig, mode: AppMode) -> Result<Self> {
        Self::build(config, mode, false).await
    }

    async fn build(config: AppConfig, mode: AppMode, install_metrics: bool) -> Result<Self> {
        info!("初始化应用程序，模式: {:?}", mode);
        config.validate().context("配置校验失败")?;

        // 记录器必须先于 MetricsCollector 安装
        let metrics_handle = if install_metrics {
            match init_metrics() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!("指标不可用: {}", e);
                    None
                }
            }
        } else {
            None
        };
        let metrics = MetricsCollector::new();

        let (sqlite, jobs, schedules, engine): (
            Option<SqliteJobStore>,
            Arc<dyn JobRepository>,
            Arc<dyn ScheduleRepository>,
            Arc<dyn CrawlEngine>,
        ) = match mode {
            AppMode::Embedded => {
                let store = InMemoryJobStore::new();
                (
                    None,
                    Arc::new(store.clone()),
                    Arc::new(store),
                    Arc::new(InMemoryCrawlEngine::new()),
                )
            }
            AppMode::Standard => {
                info!("连接数据库: {}", config.database.url);
                let store = SqliteJobStore::connect(&config.database)
                    .await
                    .context("连接数据库失败")?;
                let engine =
                    HttpCrawlEngine::new(&config.crawl_engine).context("创建爬虫引擎客户端失败")?;
                info!("爬虫引擎地址: {}", engine.base_url());
                (
                    Some(store.clone()),
                    Arc::new(store.clone()),
                    Arc::new(store),
                    Arc::new(engine),
                )
            }
        };

        let gateway = Arc::new(JobStoreGateway::new(
            jobs,
            engine,
            config.crawl_engine.status_retry.clone(),
        ));
        let launcher = Arc::new(JobLauncher::new(
            gateway.clone(),
            TemplateRenderer::from_config(&config.templates),
            metrics.clone(),
        ));
        let bridge = Arc::new(ScheduleBridge::new(
            schedules,
            launcher.clone(),
            metrics,
            Duration::from_secs(config.scheduler.tick_interval_seconds),
        ));

        Ok(Self {
            config,
            mode,
            sqlite,
            gateway,
            launcher,
            bridge,
            metrics_handle,
        })
    }

    pub fn bridge(&self) -> &Arc<ScheduleBridge> {
        &self.bridge
    }

    /// 完整的HTTP路由
    pub fn router(&self) -> Router {
        let state = AppState {
            gateway: self.gateway.clone(),
            launcher: self.launcher.clone(),
            bridge: self.bridge.clone(),
            metrics_handle: self.metrics_handle.clone(),
        };
        create_app(state, &self.config.api)
    }

    /// 运行到收到关闭信号为止
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!("启动应用程序，模式: {:?}", self.mode);

        let scheduler_handle = if self.config.scheduler.enabled {
            let restored = self
                .bridge
                .restore()
                .await
                .context("恢复定时任务失败")?;
            info!("定时任务已恢复: {}", restored);

            let bridge = Arc::clone(&self.bridge);
            let shutdown_rx = shutdown_rx.resubscribe();
            Some(tokio::spawn(async move {
                bridge.run(shutdown_rx).await;
            }))
        } else {
            info!("定时任务循环已禁用");
            None
        };

        let bind_address = self.config.api.bind_address();
        let listener = TcpListener::bind(&bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {}", bind_address))?;
        info!("API服务器启动在 http://{}", bind_address);

        let server = axum::serve(listener, self.router()).with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("API服务器收到关闭信号");
        });
        if let Err(e) = server.await {
            error!("API服务器运行失败: {}", e);
        }

        if let Some(handle) = scheduler_handle {
            if let Err(e) = handle.await {
                error!("定时任务循环异常退出: {}", e);
            }
        }

        if let Some(store) = &self.sqlite {
            store.close().await;
            info!("数据库连接已关闭");
        }

        info!("应用程序已停止");
        Ok(())
    }
}
