//! Test data builders

use crawl_admin_core::{JobConfig, ScheduleState, ScheduledJob};

/// Builds job configuration text with the fields the crawl engine requires
pub struct JobConfigBuilder {
    id: Option<String>,
    warc_prefix: String,
    seeds: Vec<String>,
    ignore_robots: bool,
}

impl JobConfigBuilder {
    pub fn new() -> Self {
        Self {
            id: None,
            warc_prefix: "test".to_string(),
            seeds: vec!["http://a.example".to_string()],
            ignore_robots: false,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_warc_prefix(mut self, prefix: &str) -> Self {
        self.warc_prefix = prefix.to_string();
        self
    }

    pub fn with_seeds(mut self, seeds: &[&str]) -> Self {
        self.seeds = seeds.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn ignoring_robots(mut self) -> Self {
        self.ignore_robots = true;
        self
    }

    pub fn build_text(&self) -> String {
        let mut text = String::new();
        if let Some(id) = &self.id {
            text.push_str(&format!("id: {id}\n"));
        }
        text.push_str(&format!("ignore_robots: {}\n", self.ignore_robots));
        text.push_str(&format!(
            "warcprox_meta:\n  warc-prefix: {}\n",
            self.warc_prefix
        ));
        if self.seeds.is_empty() {
            text.push_str("seeds: []\n");
        } else {
            text.push_str("seeds:\n");
            for seed in &self.seeds {
                text.push_str(&format!("  - url: {seed}\n"));
            }
        }
        text
    }

    pub fn build(&self) -> JobConfig {
        JobConfig::parse(&self.build_text()).unwrap()
    }
}

impl Default for JobConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for ScheduledJob entities
pub struct ScheduledJobBuilder {
    schedule: ScheduledJob,
}

impl ScheduledJobBuilder {
    pub fn new() -> Self {
        Self {
            schedule: ScheduledJob::new(
                "sched-1".to_string(),
                "example-site".to_string(),
                "daily".to_string(),
                JobConfigBuilder::new().build_text(),
                3,
                0,
            ),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.schedule.id = id.to_string();
        self
    }

    pub fn with_crawl_request(mut self, name: &str) -> Self {
        self.schedule.crawl_request_name = name.to_string();
        self
    }

    pub fn with_job_name(mut self, job_name: &str) -> Self {
        self.schedule.job_name = job_name.to_string();
        self
    }

    pub fn at(mut self, hour: u32, minute: u32) -> Self {
        self.schedule.hour = hour;
        self.schedule.minute = minute;
        self
    }

    pub fn cancelled(mut self) -> Self {
        self.schedule.state = ScheduleState::Cancelled;
        self
    }

    pub fn build(self) -> ScheduledJob {
        self.schedule
    }
}

impl Default for ScheduledJobBuilder {
    fn default() -> Self {
        Self::new()
    }
}
