use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crawl_admin_core::{
    CrawlAdminError, CrawlAdminResult, ScheduleRepository, ScheduleState, ScheduledJob,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::SqliteJobStore;

const SCHEDULE_COLUMNS: &str = "id, crawl_request_name, job_name, job_config_template, hour, minute, state, last_fired_at, created_at";

fn row_to_schedule(row: &SqliteRow) -> CrawlAdminResult<ScheduledJob> {
    let hour: i64 = row.try_get("hour")?;
    let minute: i64 = row.try_get("minute")?;
    let state: String = row.try_get("state")?;

    Ok(ScheduledJob {
        id: row.try_get("id")?,
        crawl_request_name: row.try_get("crawl_request_name")?,
        job_name: row.try_get("job_name")?,
        job_config_template: row.try_get("job_config_template")?,
        hour: hour as u32,
        minute: minute as u32,
        state: ScheduleState::parse(&state)?,
        last_fired_at: row.try_get("last_fired_at")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl ScheduleRepository for SqliteJobStore {
    async fn create_schedule(&self, schedule: &ScheduledJob) -> CrawlAdminResult<()> {
        sqlx::query(&format!(
            "INSERT INTO scheduled_jobs ({SCHEDULE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&schedule.id)
        .bind(&schedule.crawl_request_name)
        .bind(&schedule.job_name)
        .bind(&schedule.job_config_template)
        .bind(schedule.hour as i64)
        .bind(schedule.minute as i64)
        .bind(schedule.state.as_str())
        .bind(schedule.last_fired_at)
        .bind(schedule.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_schedule(&self, id: &str) -> CrawlAdminResult<Option<ScheduledJob>> {
        let row = sqlx::query(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM scheduled_jobs WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_schedule).transpose()
    }

    async fn list_schedules(
        &self,
        crawl_request_name: Option<&str>,
    ) -> CrawlAdminResult<Vec<ScheduledJob>> {
        let rows = match crawl_request_name {
            Some(name) => {
                sqlx::query(&format!(
                    "SELECT {SCHEDULE_COLUMNS} FROM scheduled_jobs WHERE crawl_request_name = ? ORDER BY created_at, id"
                ))
                .bind(name)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {SCHEDULE_COLUMNS} FROM scheduled_jobs ORDER BY created_at, id"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(row_to_schedule).collect()
    }

    async fn update_schedule_state(&self, id: &str, state: ScheduleState) -> CrawlAdminResult<()> {
        let result = sqlx::query("UPDATE scheduled_jobs SET state = ? WHERE id = ?")
            .bind(state.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CrawlAdminError::ScheduleNotFound { id: id.to_string() });
        }
        Ok(())
    }

    async fn record_schedule_fired(
        &self,
        id: &str,
        fired_at: DateTime<Utc>,
    ) -> CrawlAdminResult<()> {
        let result = sqlx::query("UPDATE scheduled_jobs SET last_fired_at = ? WHERE id = ?")
            .bind(fired_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CrawlAdminError::ScheduleNotFound { id: id.to_string() });
        }
        Ok(())
    }
}
