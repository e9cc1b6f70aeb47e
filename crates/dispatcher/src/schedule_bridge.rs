//! 每日定时任务
//!
//! 定时任务持久化在 `ScheduleRepository` 中，已注册的任务同时保存在进程内的
//! 注册表里，由 `run` 启动的定时循环按 `scheduler.tick_interval_seconds` 检查并触发。
//!
//! 同一个定时任务的触发通过各自的异步锁串行执行，同一个触发时间点最多启动一个任务。
//! 触发失败只记录日志，不会取消定时任务。

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use crawl_admin_core::{
    CrawlAdminError, CrawlAdminResult, JobConfig, ScheduleKey, ScheduleRepository,
    ScheduleState, ScheduledJob,
};
use crawl_admin_domain::JobStoreGateway;
use crawl_admin_infrastructure::{MetricsCollector, StructuredLogger};
use futures::future::join_all;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cron_utils::CronScheduler;
use crate::launcher::JobLauncher;

struct RegisteredSchedule {
    schedule: ScheduledJob,
    cron: CronScheduler,
    /// 最近一次触发的时间点，触发期间持有锁
    last_fired: Mutex<Option<DateTime<Utc>>>,
}

impl RegisteredSchedule {
    fn new(schedule: ScheduledJob) -> CrawlAdminResult<Self> {
        let cron = CronScheduler::new(&schedule.cron_expression())?;
        let last_fired = Mutex::new(schedule.last_fired_at);
        Ok(Self {
            schedule,
            cron,
            last_fired,
        })
    }
}

pub struct ScheduleBridge {
    repository: Arc<dyn ScheduleRepository>,
    gateway: Arc<JobStoreGateway>,
    launcher: Arc<JobLauncher>,
    metrics: MetricsCollector,
    tick_interval: Duration,
    registry: RwLock<HashMap<String, Arc<RegisteredSchedule>>>,
    /// 串行化注册过程，重复检查和写入之间不能插入另一个注册
    registration: Mutex<()>,
}

impl ScheduleBridge {
    pub fn new(
        repository: Arc<dyn ScheduleRepository>,
        launcher: Arc<JobLauncher>,
        metrics: MetricsCollector,
        tick_interval: Duration,
    ) -> Self {
        Self {
            repository,
            gateway: launcher.gateway().clone(),
            launcher,
            metrics,
            tick_interval,
            registry: RwLock::new(HashMap::new()),
            registration: Mutex::new(()),
        }
    }

    fn registered(&self, id: &str) -> Option<Arc<RegisteredSchedule>> {
        self.registry
            .read()
            .ok()
            .and_then(|registry| registry.get(id).cloned())
    }

    fn snapshot(&self) -> Vec<Arc<RegisteredSchedule>> {
        self.registry
            .read()
            .map(|registry| registry.values().cloned().collect())
            .unwrap_or_default()
    }

    fn insert(&self, entry: Arc<RegisteredSchedule>) -> CrawlAdminResult<()> {
        let mut registry = self
            .registry
            .write()
            .map_err(|_| CrawlAdminError::Internal("定时任务注册表锁已损坏".to_string()))?;
        registry.insert(entry.schedule.id.clone(), entry);
        self.metrics.set_registered_schedules(registry.len());
        Ok(())
    }

    fn remove(&self, id: &str) -> Option<Arc<RegisteredSchedule>> {
        let mut registry = self.registry.write().ok()?;
        let removed = registry.remove(id);
        self.metrics.set_registered_schedules(registry.len());
        removed
    }

    pub fn registered_count(&self) -> usize {
        self.registry.read().map(|r| r.len()).unwrap_or_default()
    }

    /// 注册每日 `hour:minute` 触发的任务
    pub async fn schedule_job(
        &self,
        crawl_request_name: &str,
        job_name: &str,
        config_template: &str,
        hour: u32,
        minute: u32,
    ) -> CrawlAdminResult<ScheduledJob> {
        ScheduledJob::validate_time(hour, minute)?;
        let job_name = job_name.trim();
        if job_name.is_empty() {
            return Err(CrawlAdminError::invalid_params("定时任务名称不能为空"));
        }
        JobConfig::parse(config_template)?;
        self.gateway.get_crawl_request(crawl_request_name).await?;

        let _registration = self.registration.lock().await;

        let key = ScheduleKey {
            crawl_request_name: crawl_request_name.to_string(),
            job_name: job_name.to_string(),
            hour,
            minute,
        };
        if self.snapshot().iter().any(|entry| entry.schedule.key() == key) {
            return Err(CrawlAdminError::DuplicateSchedule {
                crawl_request: crawl_request_name.to_string(),
                job_name: job_name.to_string(),
                hour,
                minute,
            });
        }

        let schedule = ScheduledJob::new(
            Uuid::new_v4().to_string(),
            crawl_request_name.to_string(),
            job_name.to_string(),
            config_template.to_string(),
            hour,
            minute,
        );
        let entry = Arc::new(RegisteredSchedule::new(schedule.clone())?);

        self.repository.create_schedule(&schedule).await?;
        self.insert(entry)?;

        StructuredLogger::log_schedule_registered(
            &schedule.id,
            crawl_request_name,
            job_name,
            hour,
            minute,
        );
        Ok(schedule)
    }

    /// 取消定时任务，已取消的任务再次取消不做任何事
    ///
    /// 返回时不会有正在进行的触发。
    pub async fn cancel_schedule(&self, id: &str) -> CrawlAdminResult<ScheduledJob> {
        let mut schedule = self
            .repository
            .get_schedule(id)
            .await?
            .ok_or_else(|| CrawlAdminError::ScheduleNotFound { id: id.to_string() })?;

        if schedule.state == ScheduleState::Cancelled {
            debug!("定时任务 {} 已经取消", id);
            return Ok(schedule);
        }

        self.repository
            .update_schedule_state(id, ScheduleState::Cancelled)
            .await?;
        if let Some(entry) = self.remove(id) {
            let _in_flight = entry.last_fired.lock().await;
        }

        schedule.state = ScheduleState::Cancelled;
        StructuredLogger::log_schedule_cancelled(id);
        Ok(schedule)
    }

    pub async fn list_schedules(
        &self,
        crawl_request_name: Option<&str>,
    ) -> CrawlAdminResult<Vec<ScheduledJob>> {
        self.repository.list_schedules(crawl_request_name).await
    }

    pub async fn get_schedule(&self, id: &str) -> CrawlAdminResult<ScheduledJob> {
        self.repository
            .get_schedule(id)
            .await?
            .ok_or_else(|| CrawlAdminError::ScheduleNotFound { id: id.to_string() })
    }

    /// 下一次触发时间，已取消的任务返回 `None`
    pub fn next_fire_time(&self, id: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.registered(id)
            .and_then(|entry| entry.cron.next_execution_time(now))
    }

    /// 启动时从存储恢复已注册的定时任务，返回恢复的数量
    pub async fn restore(&self) -> CrawlAdminResult<usize> {
        let schedules = self.repository.list_schedules(None).await?;
        let mut restored = 0;

        for schedule in schedules.into_iter().filter(ScheduledJob::is_registered) {
            let id = schedule.id.clone();
            match RegisteredSchedule::new(schedule) {
                Ok(entry) => {
                    self.insert(Arc::new(entry))?;
                    restored += 1;
                }
                Err(e) => warn!("跳过无法恢复的定时任务 {}: {}", id, e),
            }
        }

        info!("已恢复 {} 个定时任务", restored);
        Ok(restored)
    }

    /// 按 `now` 所在的触发时间点触发定时任务
    ///
    /// 返回启动的任务ID；该时间点已经触发过或定时任务已取消时返回 `None`。
    pub async fn fire(&self, id: &str, now: DateTime<Utc>) -> CrawlAdminResult<Option<String>> {
        match self.registered(id) {
            Some(entry) => self.fire_entry(&entry, now).await,
            None => {
                self.get_schedule(id).await?;
                debug!("定时任务 {} 未注册，跳过触发", id);
                Ok(None)
            }
        }
    }

    async fn fire_entry(
        &self,
        entry: &Arc<RegisteredSchedule>,
        now: DateTime<Utc>,
    ) -> CrawlAdminResult<Option<String>> {
        let schedule = &entry.schedule;
        let Some(slot) = entry.cron.previous_execution_time(now) else {
            return Ok(None);
        };

        let mut last_fired = entry.last_fired.lock().await;
        if self.registered(&schedule.id).is_none() {
            return Ok(None);
        }
        if last_fired.is_some_and(|fired| fired >= slot) {
            debug!("定时任务 {} 在 {} 已触发过", schedule.id, slot);
            return Ok(None);
        }

        // 无论成功与否，该时间点都算作已触发
        *last_fired = Some(slot);
        if let Err(e) = self.repository.record_schedule_fired(&schedule.id, slot).await {
            warn!("记录定时任务 {} 触发时间失败: {}", schedule.id, e);
        }

        match self.launch_firing(schedule).await {
            Ok(job_id) => {
                StructuredLogger::log_schedule_fired(&schedule.id, &job_id, slot);
                self.metrics.record_schedule_fired(true);
                Ok(Some(job_id))
            }
            Err(e) => {
                StructuredLogger::log_schedule_fire_failed(&schedule.id, slot, &e.to_string());
                self.metrics.record_schedule_fired(false);
                Err(e)
            }
        }
    }

    async fn launch_firing(&self, schedule: &ScheduledJob) -> CrawlAdminResult<String> {
        let job_id = self
            .gateway
            .generate_job_id(&schedule.crawl_request_name)
            .await?;

        let mut config = JobConfig::parse(&schedule.job_config_template)?;
        config.set_id(&job_id);
        let text = config.to_yaml()?;

        self.launcher
            .launch_from(&schedule.crawl_request_name, &job_id, &text, "scheduled")
            .await?;
        Ok(job_id)
    }

    /// 触发所有到期的定时任务
    pub async fn tick(&self, now: DateTime<Utc>) {
        let mut due = Vec::new();
        for entry in self.snapshot() {
            // 正在触发中的定时任务留给下一轮检查
            let Ok(last_fired) = entry.last_fired.try_lock() else {
                continue;
            };
            let baseline = last_fired.unwrap_or(entry.schedule.created_at);
            drop(last_fired);

            if entry.cron.should_trigger(Some(baseline), now) {
                if entry.cron.is_overdue(baseline, now, 5) {
                    warn!("定时任务 {} 的触发时间已过去超过5分钟", entry.schedule.id);
                }
                due.push(entry);
            }
        }

        let results = join_all(due.iter().map(|entry| self.fire_entry(entry, now))).await;
        for (entry, result) in due.iter().zip(results) {
            if let Err(e) = result {
                error!("定时任务 {} 触发失败: {}", entry.schedule.id, e);
            }
        }
    }

    /// 定时循环，收到停止信号后退出
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        info!("定时任务循环已启动，检查间隔 {:?}", self.tick_interval);
        let mut ticker = tokio::time::interval(self.tick_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick(Utc::now()).await,
                _ = shutdown.recv() => {
                    info!("定时任务循环收到停止信号");
                    break;
                }
            }
        }
    }
}
