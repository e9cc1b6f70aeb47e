use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crawl_admin_core::{
    CrawlAdminError, CrawlAdminResult, CrawlRequest, JobConfig, JobRecord, JobRepository,
    JobStatus, ScheduleRepository, ScheduleState, ScheduledJob,
};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct StoreState {
    crawl_requests: HashMap<String, CrawlRequest>,
    job_counters: HashMap<String, u64>,
    jobs: HashMap<String, JobRecord>,
    schedules: HashMap<String, ScheduledJob>,
}

/// 内存任务存储
///
/// 嵌入式模式和测试使用，进程退出后数据丢失。所有修改都在同一把写锁下完成，
/// 任务序号的递增与SQLite实现一样是原子的。
#[derive(Debug, Clone, Default)]
pub struct InMemoryJobStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn job_count(&self) -> usize {
        self.state.read().await.jobs.len()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobStore {
    async fn create_crawl_request(&self, name: &str) -> CrawlAdminResult<CrawlRequest> {
        let mut state = self.state.write().await;
        if state.crawl_requests.contains_key(name) {
            return Err(CrawlAdminError::DuplicateCrawlRequest {
                name: name.to_string(),
            });
        }

        let request = CrawlRequest::new(name.to_string());
        state
            .crawl_requests
            .insert(name.to_string(), request.clone());
        state.job_counters.insert(name.to_string(), 0);
        Ok(request)
    }

    async fn get_crawl_request(&self, name: &str) -> CrawlAdminResult<Option<CrawlRequest>> {
        Ok(self.state.read().await.crawl_requests.get(name).cloned())
    }

    async fn list_crawl_requests(&self) -> CrawlAdminResult<Vec<CrawlRequest>> {
        let mut requests: Vec<_> = self
            .state
            .read()
            .await
            .crawl_requests
            .values()
            .cloned()
            .collect();
        requests.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(requests)
    }

    async fn next_job_sequence(&self, crawl_request_name: &str) -> CrawlAdminResult<u64> {
        let mut state = self.state.write().await;
        let counter = state
            .job_counters
            .get_mut(crawl_request_name)
            .ok_or_else(|| CrawlAdminError::unknown_crawl_request(crawl_request_name))?;
        *counter += 1;
        Ok(*counter)
    }

    async fn get_last_job_config(
        &self,
        crawl_request_name: &str,
    ) -> CrawlAdminResult<Option<JobConfig>> {
        let state = self.state.read().await;
        let config = state
            .crawl_requests
            .get(crawl_request_name)
            .and_then(|request| request.last_job_id())
            .and_then(|job_id| state.jobs.get(job_id))
            .map(|record| record.config.clone());
        Ok(config)
    }

    async fn record_job(&self, record: &JobRecord) -> CrawlAdminResult<()> {
        let mut state = self.state.write().await;
        if state.jobs.contains_key(&record.job_id) {
            return Err(CrawlAdminError::invalid_params(format!(
                "任务ID已被使用: {}",
                record.job_id
            )));
        }

        let request = state
            .crawl_requests
            .get_mut(&record.crawl_request_name)
            .ok_or_else(|| CrawlAdminError::unknown_crawl_request(&record.crawl_request_name))?;
        request.job_list.push(record.job_id.clone());
        state.jobs.insert(record.job_id.clone(), record.clone());

        debug!("内存存储记录任务: {}", record.job_id);
        Ok(())
    }

    async fn get_job(&self, job_id: &str) -> CrawlAdminResult<Option<JobRecord>> {
        Ok(self.state.read().await.jobs.get(job_id).cloned())
    }

    async fn update_job_status(&self, job_id: &str, status: JobStatus) -> CrawlAdminResult<()> {
        let mut state = self.state.write().await;
        let record = state
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| CrawlAdminError::unknown_job(job_id))?;
        record.status = status;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn add_bulk_urls(&self, job_id: &str, urls: &[String]) -> CrawlAdminResult<()> {
        let mut state = self.state.write().await;
        let record = state
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| CrawlAdminError::unknown_job(job_id))?;
        record.bulk_urls.extend(urls.iter().cloned());
        record.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl ScheduleRepository for InMemoryJobStore {
    async fn create_schedule(&self, schedule: &ScheduledJob) -> CrawlAdminResult<()> {
        let mut state = self.state.write().await;
        if state.schedules.contains_key(&schedule.id) {
            return Err(CrawlAdminError::Database(format!(
                "定时任务ID重复: {}",
                schedule.id
            )));
        }
        state
            .schedules
            .insert(schedule.id.clone(), schedule.clone());
        Ok(())
    }

    async fn get_schedule(&self, id: &str) -> CrawlAdminResult<Option<ScheduledJob>> {
        Ok(self.state.read().await.schedules.get(id).cloned())
    }

    async fn list_schedules(
        &self,
        crawl_request_name: Option<&str>,
    ) -> CrawlAdminResult<Vec<ScheduledJob>> {
        let state = self.state.read().await;
        let mut schedules: Vec<_> = state
            .schedules
            .values()
            .filter(|s| crawl_request_name.map_or(true, |name| s.crawl_request_name == name))
            .cloned()
            .collect();
        schedules.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(schedules)
    }

    async fn update_schedule_state(&self, id: &str, state: ScheduleState) -> CrawlAdminResult<()> {
        let mut store = self.state.write().await;
        let schedule = store
            .schedules
            .get_mut(id)
            .ok_or_else(|| CrawlAdminError::ScheduleNotFound { id: id.to_string() })?;
        schedule.state = state;
        Ok(())
    }

    async fn record_schedule_fired(
        &self,
        id: &str,
        fired_at: DateTime<Utc>,
    ) -> CrawlAdminResult<()> {
        let mut state = self.state.write().await;
        let schedule = state
            .schedules
            .get_mut(id)
            .ok_or_else(|| CrawlAdminError::ScheduleNotFound { id: id.to_string() })?;
        schedule.last_fired_at = Some(fired_at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(job_id: &str, name: &str) -> JobRecord {
        let config = JobConfig::parse(&format!("id: {job_id}\n")).unwrap();
        JobRecord::new(job_id.to_string(), name.to_string(), config)
    }

    #[tokio::test]
    async fn test_job_sequence_per_crawl_request() {
        let store = InMemoryJobStore::new();
        store.create_crawl_request("a").await.unwrap();
        store.create_crawl_request("b").await.unwrap();

        assert_eq!(store.next_job_sequence("a").await.unwrap(), 1);
        assert_eq!(store.next_job_sequence("a").await.unwrap(), 2);
        assert_eq!(store.next_job_sequence("b").await.unwrap(), 1);
        assert!(store.next_job_sequence("c").await.is_err());
    }

    #[tokio::test]
    async fn test_record_job_appends_to_job_list() {
        let store = InMemoryJobStore::new();
        store.create_crawl_request("a").await.unwrap();
        store.record_job(&record("a-1", "a")).await.unwrap();
        store.record_job(&record("a-2", "a")).await.unwrap();

        let request = store.get_crawl_request("a").await.unwrap().unwrap();
        assert_eq!(request.job_list, vec!["a-1", "a-2"]);
        let last = store.get_last_job_config("a").await.unwrap().unwrap();
        assert_eq!(last.id(), Some("a-2"));

        assert!(store.record_job(&record("a-2", "a")).await.is_err());
        assert!(store.record_job(&record("x-1", "x")).await.is_err());
        assert_eq!(store.job_count().await, 2);
    }

    #[tokio::test]
    async fn test_schedule_state_changes() {
        let store = InMemoryJobStore::new();
        let schedule = ScheduledJob::new(
            "s1".to_string(),
            "a".to_string(),
            "daily".to_string(),
            "id: x\n".to_string(),
            1,
            2,
        );
        store.create_schedule(&schedule).await.unwrap();
        store
            .update_schedule_state("s1", ScheduleState::Cancelled)
            .await
            .unwrap();

        let stored = store.get_schedule("s1").await.unwrap().unwrap();
        assert_eq!(stored.state, ScheduleState::Cancelled);
        assert!(store.list_schedules(Some("other")).await.unwrap().is_empty());
        assert!(matches!(
            store.update_schedule_state("nope", ScheduleState::Cancelled).await,
            Err(CrawlAdminError::ScheduleNotFound { .. })
        ));
    }
}
