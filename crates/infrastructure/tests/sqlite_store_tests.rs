use std::collections::HashSet;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use crawl_admin_core::{
    CrawlAdminError, DatabaseConfig, JobConfig, JobRecord, JobRepository, JobStatus,
    ScheduleRepository, ScheduleState, ScheduledJob,
};
use crawl_admin_infrastructure::SqliteJobStore;
use tempfile::TempDir;

async fn setup_store(table: &str) -> (TempDir, SqliteJobStore) {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("crawl-admin.db").display()),
        crawl_requests_table: table.to_string(),
        ..DatabaseConfig::default()
    };
    let store = SqliteJobStore::connect(&config).await.unwrap();
    (dir, store)
}

fn record(job_id: &str, name: &str) -> JobRecord {
    let config = JobConfig::parse(&format!(
        "id: {job_id}\nignore_robots: false\nwarcprox_meta:\n  warc-prefix: {name}\nseeds:\n  - url: http://a.example\n"
    ))
    .unwrap();
    JobRecord::new(job_id.to_string(), name.to_string(), config)
}

#[tokio::test]
async fn test_crawl_request_lifecycle() {
    let (_dir, store) = setup_store("crawl_requests").await;
    store.health_check().await.unwrap();

    store.create_crawl_request("zeta").await.unwrap();
    store.create_crawl_request("alpha").await.unwrap();
    assert!(matches!(
        store.create_crawl_request("alpha").await,
        Err(CrawlAdminError::DuplicateCrawlRequest { .. })
    ));

    store.record_job(&record("alpha-1", "alpha")).await.unwrap();
    store.record_job(&record("alpha-2", "alpha")).await.unwrap();

    let requests = store.list_crawl_requests().await.unwrap();
    let names: Vec<_> = requests.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
    assert_eq!(requests[0].job_list, vec!["alpha-1", "alpha-2"]);
    assert!(requests[1].job_list.is_empty());

    assert!(store.get_crawl_request("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_custom_table_name() {
    let (_dir, store) = setup_store("brozzler_requests").await;
    store.create_crawl_request("example-site").await.unwrap();
    assert_eq!(store.next_job_sequence("example-site").await.unwrap(), 1);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM brozzler_requests")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_job_sequence_is_atomic() {
    let (_dir, store) = setup_store("crawl_requests").await;
    let store = Arc::new(store);
    store.create_crawl_request("example-site").await.unwrap();

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.next_job_sequence("example-site").await })
        })
        .collect();

    let mut sequences = HashSet::new();
    for handle in handles {
        sequences.insert(handle.await.unwrap().unwrap());
    }
    assert_eq!(sequences.len(), 20);
    assert_eq!(sequences.iter().max(), Some(&20));

    assert!(matches!(
        store.next_job_sequence("missing").await,
        Err(CrawlAdminError::UnknownCrawlRequest { .. })
    ));
}

#[tokio::test]
async fn test_job_records() {
    let (_dir, store) = setup_store("crawl_requests").await;
    store.create_crawl_request("example-site").await.unwrap();
    assert!(store.get_last_job_config("example-site").await.unwrap().is_none());

    store.record_job(&record("example-site-1", "example-site")).await.unwrap();
    store.record_job(&record("example-site-2", "example-site")).await.unwrap();

    let last = store.get_last_job_config("example-site").await.unwrap().unwrap();
    assert_eq!(last.id(), Some("example-site-2"));
    assert_eq!(last.seeds(), vec!["http://a.example"]);

    assert!(matches!(
        store.record_job(&record("example-site-2", "example-site")).await,
        Err(CrawlAdminError::InvalidParameters(_))
    ));
    assert!(matches!(
        store.record_job(&record("other-1", "other")).await,
        Err(CrawlAdminError::UnknownCrawlRequest { .. })
    ));

    store
        .update_job_status("example-site-1", JobStatus::Stopped)
        .await
        .unwrap();
    store
        .add_bulk_urls(
            "example-site-1",
            &["http://a.example/x".to_string(), "http://a.example/y".to_string()],
        )
        .await
        .unwrap();

    let job = store.get_job("example-site-1").await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Stopped);
    assert_eq!(job.bulk_urls.len(), 2);
    assert_eq!(job.crawl_request_name, "example-site");

    assert!(matches!(
        store.update_job_status("missing", JobStatus::Running).await,
        Err(CrawlAdminError::UnknownJob { .. })
    ));
    assert!(matches!(
        store.add_bulk_urls("missing", &[]).await,
        Err(CrawlAdminError::UnknownJob { .. })
    ));
}

#[tokio::test]
async fn test_schedules() {
    let (_dir, store) = setup_store("crawl_requests").await;
    store.create_crawl_request("example-site").await.unwrap();

    let schedule = ScheduledJob::new(
        "sched-1".to_string(),
        "example-site".to_string(),
        "daily".to_string(),
        "id: x\nseeds: []\n".to_string(),
        3,
        30,
    );
    store.create_schedule(&schedule).await.unwrap();

    let fired_at = Utc.with_ymd_and_hms(2024, 5, 1, 3, 30, 0).unwrap();
    store.record_schedule_fired("sched-1", fired_at).await.unwrap();
    store
        .update_schedule_state("sched-1", ScheduleState::Cancelled)
        .await
        .unwrap();

    let stored = store.get_schedule("sched-1").await.unwrap().unwrap();
    assert_eq!(stored.state, ScheduleState::Cancelled);
    assert_eq!(stored.last_fired_at, Some(fired_at));
    assert_eq!((stored.hour, stored.minute), (3, 30));

    assert_eq!(store.list_schedules(None).await.unwrap().len(), 1);
    assert_eq!(
        store.list_schedules(Some("example-site")).await.unwrap().len(),
        1
    );
    assert!(store.list_schedules(Some("other")).await.unwrap().is_empty());
    assert!(matches!(
        store
            .update_schedule_state("missing", ScheduleState::Cancelled)
            .await,
        Err(CrawlAdminError::ScheduleNotFound { .. })
    ));
}
