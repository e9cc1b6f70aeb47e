use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// 定时任务检查间隔，必须小于一分钟才不会错过触发点
    pub tick_interval_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_seconds: 20,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tick_interval_seconds == 0 || self.tick_interval_seconds >= 60 {
            return Err(anyhow::anyhow!(
                "定时检查间隔必须在1到59秒之间: {}",
                self.tick_interval_seconds
            ));
        }
        Ok(())
    }
}
