//! Test doubles for the crawl engine and job repository traits

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use crawl_admin_core::{
    CrawlAdminError, CrawlAdminResult, CrawlEngine, CrawlRequest, JobConfig, JobRecord,
    JobRepository, JobStatus,
};

#[derive(Debug, Default)]
struct EngineState {
    statuses: HashMap<String, JobStatus>,
    submitted: Vec<(String, JobConfig)>,
    stopped: Vec<String>,
    fail_submissions: bool,
    fail_stops: bool,
    status_failures_remaining: u32,
    status_calls: u32,
}

/// Mock crawl engine with failure injection and call counting
#[derive(Debug, Clone, Default)]
pub struct MockCrawlEngine {
    state: Arc<Mutex<EngineState>>,
    submit_delay: Option<Duration>,
}

impl MockCrawlEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep inside `submit_job`, widening race windows in concurrency tests
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = Some(delay);
        self
    }

    pub fn set_status(&self, job_id: &str, status: JobStatus) {
        self.state
            .lock()
            .unwrap()
            .statuses
            .insert(job_id.to_string(), status);
    }

    /// Drop a job from the engine, as if it was lost on the engine side
    pub fn forget_job(&self, job_id: &str) {
        self.state.lock().unwrap().statuses.remove(job_id);
    }

    pub fn fail_submissions(&self, fail: bool) {
        self.state.lock().unwrap().fail_submissions = fail;
    }

    pub fn fail_stops(&self, fail: bool) {
        self.state.lock().unwrap().fail_stops = fail;
    }

    /// The next `count` status calls return `BackendUnavailable`
    pub fn fail_status_calls(&self, count: u32) {
        self.state.lock().unwrap().status_failures_remaining = count;
    }

    pub fn submit_count(&self) -> usize {
        self.state.lock().unwrap().submitted.len()
    }

    pub fn submitted_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .submitted
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn submitted_config(&self, job_id: &str) -> Option<JobConfig> {
        self.state
            .lock()
            .unwrap()
            .submitted
            .iter()
            .find(|(id, _)| id == job_id)
            .map(|(_, config)| config.clone())
    }

    pub fn stop_count(&self) -> usize {
        self.state.lock().unwrap().stopped.len()
    }

    pub fn status_call_count(&self) -> u32 {
        self.state.lock().unwrap().status_calls
    }
}

#[async_trait]
impl CrawlEngine for MockCrawlEngine {
    async fn submit_job(&self, job_id: &str, config: &JobConfig) -> CrawlAdminResult<()> {
        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        if state.fail_submissions {
            return Err(CrawlAdminError::backend_unavailable(
                "mock_engine",
                "submission refused",
            ));
        }
        state.submitted.push((job_id.to_string(), config.clone()));
        state
            .statuses
            .insert(job_id.to_string(), JobStatus::Running);
        Ok(())
    }

    async fn job_status(&self, job_id: &str) -> CrawlAdminResult<JobStatus> {
        let mut state = self.state.lock().unwrap();
        state.status_calls += 1;
        if state.status_failures_remaining > 0 {
            state.status_failures_remaining -= 1;
            return Err(CrawlAdminError::backend_unavailable(
                "mock_engine",
                "status unavailable",
            ));
        }
        state
            .statuses
            .get(job_id)
            .copied()
            .ok_or_else(|| CrawlAdminError::unknown_job(job_id))
    }

    async fn stop_job(&self, job_id: &str) -> CrawlAdminResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_stops {
            return Err(CrawlAdminError::backend_unavailable(
                "mock_engine",
                "stop refused",
            ));
        }
        if !state.statuses.contains_key(job_id) {
            return Err(CrawlAdminError::unknown_job(job_id));
        }
        state.stopped.push(job_id.to_string());
        state
            .statuses
            .insert(job_id.to_string(), JobStatus::Stopped);
        Ok(())
    }

    fn name(&self) -> &str {
        "mock_engine"
    }
}

/// Repository that fails one write operation, everything else is delegated
pub struct FailingJobRepository {
    inner: Arc<dyn JobRepository>,
    fail_record_job: bool,
    fail_bulk_urls: bool,
}

impl FailingJobRepository {
    /// `record_job` always fails
    pub fn new(inner: Arc<dyn JobRepository>) -> Self {
        Self {
            inner,
            fail_record_job: true,
            fail_bulk_urls: false,
        }
    }

    /// `add_bulk_urls` always fails, jobs are still recorded
    pub fn failing_bulk_urls(inner: Arc<dyn JobRepository>) -> Self {
        Self {
            inner,
            fail_record_job: false,
            fail_bulk_urls: true,
        }
    }
}

#[async_trait]
impl JobRepository for FailingJobRepository {
    async fn create_crawl_request(&self, name: &str) -> CrawlAdminResult<CrawlRequest> {
        self.inner.create_crawl_request(name).await
    }

    async fn get_crawl_request(&self, name: &str) -> CrawlAdminResult<Option<CrawlRequest>> {
        self.inner.get_crawl_request(name).await
    }

    async fn list_crawl_requests(&self) -> CrawlAdminResult<Vec<CrawlRequest>> {
        self.inner.list_crawl_requests().await
    }

    async fn next_job_sequence(&self, crawl_request_name: &str) -> CrawlAdminResult<u64> {
        self.inner.next_job_sequence(crawl_request_name).await
    }

    async fn get_last_job_config(
        &self,
        crawl_request_name: &str,
    ) -> CrawlAdminResult<Option<JobConfig>> {
        self.inner.get_last_job_config(crawl_request_name).await
    }

    async fn record_job(&self, record: &JobRecord) -> CrawlAdminResult<()> {
        if self.fail_record_job {
            return Err(CrawlAdminError::Database(format!(
                "disk I/O error while recording {}",
                record.job_id
            )));
        }
        self.inner.record_job(record).await
    }

    async fn get_job(&self, job_id: &str) -> CrawlAdminResult<Option<JobRecord>> {
        self.inner.get_job(job_id).await
    }

    async fn update_job_status(&self, job_id: &str, status: JobStatus) -> CrawlAdminResult<()> {
        self.inner.update_job_status(job_id, status).await
    }

    async fn add_bulk_urls(&self, job_id: &str, urls: &[String]) -> CrawlAdminResult<()> {
        if self.fail_bulk_urls {
            return Err(CrawlAdminError::Database(format!(
                "disk I/O error while storing bulk urls for {job_id}"
            )));
        }
        self.inner.add_bulk_urls(job_id, urls).await
    }
}
