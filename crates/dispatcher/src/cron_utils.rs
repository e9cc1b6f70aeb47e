use chrono::{DateTime, Duration, Utc};
use cron::Schedule;
use std::str::FromStr;
use tracing::{debug, warn};

use crawl_admin_core::{CrawlAdminError, CrawlAdminResult};

/// CRON表达式解析和调度工具（六段式，UTC）
#[derive(Debug, Clone)]
pub struct CronScheduler {
    schedule: Schedule,
}

impl CronScheduler {
    pub fn new(cron_expr: &str) -> CrawlAdminResult<Self> {
        let schedule = Schedule::from_str(cron_expr).map_err(|e| {
            CrawlAdminError::invalid_params(format!("无效的CRON表达式 {cron_expr}: {e}"))
        })?;

        Ok(Self { schedule })
    }

    /// 每天 `hour:minute` 触发
    pub fn daily(hour: u32, minute: u32) -> CrawlAdminResult<Self> {
        Self::new(&format!("0 {minute} {hour} * * *"))
    }

    /// 检查从 `last_run` 之后是否已经到达新的触发时间
    pub fn should_trigger(&self, last_run: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let check_from = match last_run {
            Some(last) => last,
            // 从未执行过，只看最近一分钟内的触发点
            None => now - Duration::minutes(1),
        };

        match self.schedule.after(&check_from).next() {
            Some(next_time) => {
                let should_trigger = next_time <= now;
                if should_trigger {
                    debug!(
                        "应该触发: 基准时间={}, 触发时间={}, 当前时间={}",
                        check_from.format("%Y-%m-%d %H:%M:%S UTC"),
                        next_time.format("%Y-%m-%d %H:%M:%S UTC"),
                        now.format("%Y-%m-%d %H:%M:%S UTC")
                    );
                }
                should_trigger
            }
            None => {
                warn!(
                    "无法计算下一次执行时间，基准时间: {}",
                    check_from.format("%Y-%m-%d %H:%M:%S UTC")
                );
                false
            }
        }
    }

    pub fn next_execution_time(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&from).next()
    }

    /// 最近一天内、不晚于 `now` 的最后一个触发时间
    pub fn previous_execution_time(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let check_from = now - Duration::days(1) - Duration::seconds(1);
        self.schedule
            .after(&check_from)
            .take_while(|t| *t <= now)
            .last()
    }

    /// 触发时间已经过去超过宽限期
    pub fn is_overdue(
        &self,
        last_run: DateTime<Utc>,
        now: DateTime<Utc>,
        grace_period_minutes: i64,
    ) -> bool {
        match self.schedule.after(&last_run).next() {
            Some(expected_time) => now > expected_time + Duration::minutes(grace_period_minutes),
            None => false,
        }
    }
}
