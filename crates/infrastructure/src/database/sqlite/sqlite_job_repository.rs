use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crawl_admin_core::{
    CrawlAdminError, CrawlAdminResult, CrawlRequest, DatabaseConfig, JobConfig, JobRecord,
    JobRepository, JobStatus,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::{debug, instrument};

/// SQLite实现的任务存储，同时实现 `JobRepository` 和 `ScheduleRepository`
#[derive(Clone)]
pub struct SqliteJobStore {
    pub(super) pool: SqlitePool,
    crawl_requests_table: String,
}

impl SqliteJobStore {
    /// 使用已有连接池，不执行迁移
    pub fn new(pool: SqlitePool, crawl_requests_table: &str) -> Self {
        Self {
            pool,
            crawl_requests_table: crawl_requests_table.to_string(),
        }
    }

    /// 连接数据库并初始化表结构，数据库文件不存在时自动创建
    pub async fn connect(config: &DatabaseConfig) -> CrawlAdminResult<Self> {
        debug!("连接SQLite数据库: {}", config.url);

        let timeout = Duration::from_secs(config.connection_timeout_seconds);
        let connect_options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(timeout)
            .connect_with(connect_options)
            .await?;

        let store = Self::new(pool, &config.crawl_requests_table);
        store.run_migrations().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn health_check(&self) -> CrawlAdminResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn run_migrations(&self) -> CrawlAdminResult<()> {
        debug!("执行SQLite数据库迁移");
        let table = &self.crawl_requests_table;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                name TEXT PRIMARY KEY,
                job_counter INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id TEXT NOT NULL UNIQUE,
                crawl_request_name TEXT NOT NULL,
                config TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'PENDING',
                bulk_urls TEXT NOT NULL DEFAULT '[]',
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                FOREIGN KEY (crawl_request_name) REFERENCES {table}(name)
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS scheduled_jobs (
                id TEXT PRIMARY KEY,
                crawl_request_name TEXT NOT NULL,
                job_name TEXT NOT NULL,
                job_config_template TEXT NOT NULL,
                hour INTEGER NOT NULL,
                minute INTEGER NOT NULL,
                state TEXT NOT NULL DEFAULT 'REGISTERED',
                last_fired_at DATETIME,
                created_at DATETIME NOT NULL,
                FOREIGN KEY (crawl_request_name) REFERENCES {table}(name)
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        let indexes = [
            "CREATE INDEX IF NOT EXISTS idx_jobs_crawl_request ON jobs(crawl_request_name, seq)",
            "CREATE INDEX IF NOT EXISTS idx_scheduled_jobs_crawl_request ON scheduled_jobs(crawl_request_name)",
            "CREATE INDEX IF NOT EXISTS idx_scheduled_jobs_state ON scheduled_jobs(state)",
        ];
        for index_sql in indexes {
            sqlx::query(index_sql).execute(&self.pool).await?;
        }

        debug!("SQLite数据库迁移完成");
        Ok(())
    }

    async fn job_ids_for(&self, name: &str) -> CrawlAdminResult<Vec<String>> {
        let rows = sqlx::query("SELECT job_id FROM jobs WHERE crawl_request_name = ? ORDER BY seq")
            .bind(name)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("job_id").map_err(Into::into))
            .collect()
    }

    fn row_to_job(row: &SqliteRow) -> CrawlAdminResult<JobRecord> {
        let config: String = row.try_get("config")?;
        let bulk_urls: String = row.try_get("bulk_urls")?;

        Ok(JobRecord {
            job_id: row.try_get("job_id")?,
            crawl_request_name: row.try_get("crawl_request_name")?,
            config: JobConfig::parse(&config)
                .map_err(|e| CrawlAdminError::Serialization(e.to_string()))?,
            status: row.try_get("status")?,
            bulk_urls: serde_json::from_str(&bulk_urls)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl JobRepository for SqliteJobStore {
    #[instrument(skip(self))]
    async fn create_crawl_request(&self, name: &str) -> CrawlAdminResult<CrawlRequest> {
        let request = CrawlRequest::new(name.to_string());
        let result = sqlx::query(&format!(
            "INSERT INTO {} (name, job_counter, created_at) VALUES (?, 0, ?)",
            self.crawl_requests_table
        ))
        .bind(&request.name)
        .bind(request.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(request),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(CrawlAdminError::DuplicateCrawlRequest {
                    name: name.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_crawl_request(&self, name: &str) -> CrawlAdminResult<Option<CrawlRequest>> {
        let row = sqlx::query(&format!(
            "SELECT name, created_at FROM {} WHERE name = ?",
            self.crawl_requests_table
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(CrawlRequest {
            name: row.try_get("name")?,
            job_list: self.job_ids_for(name).await?,
            created_at: row.try_get("created_at")?,
        }))
    }

    async fn list_crawl_requests(&self) -> CrawlAdminResult<Vec<CrawlRequest>> {
        let rows = sqlx::query(&format!(
            "SELECT name, created_at FROM {} ORDER BY name",
            self.crawl_requests_table
        ))
        .fetch_all(&self.pool)
        .await?;

        let job_rows = sqlx::query("SELECT crawl_request_name, job_id FROM jobs ORDER BY seq")
            .fetch_all(&self.pool)
            .await?;
        let mut job_lists: HashMap<String, Vec<String>> = HashMap::new();
        for row in &job_rows {
            job_lists
                .entry(row.try_get("crawl_request_name")?)
                .or_default()
                .push(row.try_get("job_id")?);
        }

        rows.iter()
            .map(|row| -> CrawlAdminResult<CrawlRequest> {
                let name: String = row.try_get("name")?;
                let created_at: DateTime<Utc> = row.try_get("created_at")?;
                Ok(CrawlRequest {
                    job_list: job_lists.remove(&name).unwrap_or_default(),
                    name,
                    created_at,
                })
            })
            .collect()
    }

    /// 单条UPDATE ... RETURNING语句完成递增，并发调用不会拿到相同的序号
    #[instrument(skip(self))]
    async fn next_job_sequence(&self, crawl_request_name: &str) -> CrawlAdminResult<u64> {
        let counter: Option<i64> = sqlx::query_scalar(&format!(
            "UPDATE {} SET job_counter = job_counter + 1 WHERE name = ? RETURNING job_counter",
            self.crawl_requests_table
        ))
        .bind(crawl_request_name)
        .fetch_optional(&self.pool)
        .await?;

        counter
            .map(|n| n as u64)
            .ok_or_else(|| CrawlAdminError::unknown_crawl_request(crawl_request_name))
    }

    async fn get_last_job_config(
        &self,
        crawl_request_name: &str,
    ) -> CrawlAdminResult<Option<JobConfig>> {
        let config: Option<String> = sqlx::query_scalar(
            "SELECT config FROM jobs WHERE crawl_request_name = ? ORDER BY seq DESC LIMIT 1",
        )
        .bind(crawl_request_name)
        .fetch_optional(&self.pool)
        .await?;

        config
            .map(|text| {
                JobConfig::parse(&text).map_err(|e| CrawlAdminError::Serialization(e.to_string()))
            })
            .transpose()
    }

    #[instrument(skip(self, record), fields(job_id = %record.job_id))]
    async fn record_job(&self, record: &JobRecord) -> CrawlAdminResult<()> {
        if self.get_crawl_request(&record.crawl_request_name).await?.is_none() {
            return Err(CrawlAdminError::unknown_crawl_request(
                &record.crawl_request_name,
            ));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO jobs (job_id, crawl_request_name, config, status, bulk_urls, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.job_id)
        .bind(&record.crawl_request_name)
        .bind(record.config.to_yaml()?)
        .bind(record.status)
        .bind(serde_json::to_string(&record.bulk_urls)?)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                CrawlAdminError::invalid_params(format!("任务ID已被使用: {}", record.job_id)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_job(&self, job_id: &str) -> CrawlAdminResult<Option<JobRecord>> {
        let row = sqlx::query(
            r#"
            SELECT job_id, crawl_request_name, config, status, bulk_urls, created_at, updated_at
            FROM jobs WHERE job_id = ?
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_job).transpose()
    }

    async fn update_job_status(&self, job_id: &str, status: JobStatus) -> CrawlAdminResult<()> {
        let result = sqlx::query("UPDATE jobs SET status = ?, updated_at = ? WHERE job_id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(job_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CrawlAdminError::unknown_job(job_id));
        }
        Ok(())
    }

    async fn add_bulk_urls(&self, job_id: &str, urls: &[String]) -> CrawlAdminResult<()> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT bulk_urls FROM jobs WHERE job_id = ?")
                .bind(job_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(existing) = existing else {
            return Err(CrawlAdminError::unknown_job(job_id));
        };

        let mut bulk_urls: Vec<String> = serde_json::from_str(&existing)?;
        bulk_urls.extend(urls.iter().cloned());

        sqlx::query("UPDATE jobs SET bulk_urls = ?, updated_at = ? WHERE job_id = ?")
            .bind(serde_json::to_string(&bulk_urls)?)
            .bind(Utc::now())
            .bind(job_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
