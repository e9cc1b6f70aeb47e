mod sqlite_job_repository;
mod sqlite_schedule_repository;

pub use sqlite_job_repository::SqliteJobStore;
