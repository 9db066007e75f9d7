// src/database.rs
use crate::jobs::{Job, JobFilter, JobStatus, JobUpdate, JobWithHistory, NewJob, StatusChange};
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

const JOB_COLUMNS: &str = "id, user_id, url, job_title, company, location, description, status, \
     applied_date, notes, source_domain, created_at, updated_at";

#[derive(Debug)]
pub struct DatabaseConfig {
    pub database_path: PathBuf,
    pub pool: Option<SqlitePool>,
}

impl DatabaseConfig {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            database_path,
            pool: None,
        }
    }

    /// Initialize the database connection pool
    pub async fn init_pool(&mut self) -> Result<()> {
        if let Some(parent) = self.database_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create database directory")?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", self.database_path.display());

        let pool = SqlitePool::connect(&database_url)
            .await
            .context("Failed to connect to SQLite database")?;
        self.pool = Some(pool);

        info!("Database connection pool initialized: {}", database_url);
        Ok(())
    }

    /// Get the database pool
    pub fn pool(&self) -> Result<&SqlitePool> {
        self.pool.as_ref().ok_or_else(|| {
            anyhow::anyhow!("Database pool not initialized. Call init_pool() first.")
        })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        let pool = self.pool()?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                url TEXT NOT NULL,
                job_title TEXT NOT NULL,
                company TEXT NOT NULL,
                location TEXT,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'SAVED',
                applied_date TEXT,
                notes TEXT,
                source_domain TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS job_status_history (
                id TEXT PRIMARY KEY,
                job_id TEXT NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
                from_status TEXT,
                to_status TEXT NOT NULL,
                changed_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_user_id ON jobs(user_id);")
            .execute(pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_history_job_id ON job_status_history(job_id);",
        )
        .execute(pool)
        .await?;

        info!("Database migrations completed successfully");
        Ok(())
    }
}

/// Job records and their status history. Every query is scoped to one user.
pub struct JobRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> JobRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a job together with its initial history entry.
    pub async fn create(&self, user_id: &str, new_job: NewJob, source_domain: &str) -> Result<Job> {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            url: new_job.url,
            job_title: new_job.job_title,
            company: new_job.company,
            location: new_job.location.filter(|s| !s.is_empty()),
            description: new_job.description.filter(|s| !s.is_empty()),
            status: new_job.status.unwrap_or_default(),
            applied_date: new_job.applied_date,
            notes: new_job.notes.filter(|s| !s.is_empty()),
            source_domain: source_domain.to_string(),
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO jobs (id, user_id, url, job_title, company, location, description,
                              status, applied_date, notes, source_domain, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.id)
        .bind(&job.user_id)
        .bind(&job.url)
        .bind(&job.job_title)
        .bind(&job.company)
        .bind(&job.location)
        .bind(&job.description)
        .bind(job.status)
        .bind(job.applied_date)
        .bind(&job.notes)
        .bind(&job.source_domain)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&mut *tx)
        .await?;

        record_status_change(&mut tx, &job.id, None, job.status).await?;
        tx.commit().await?;

        info!("Created job {} for user {}", job.id, user_id);
        Ok(job)
    }

    /// Jobs matching the filter, most recently updated first, each with its
    /// latest status change.
    pub async fn list(&self, user_id: &str, filter: &JobFilter) -> Result<Vec<JobWithHistory>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM jobs WHERE user_id = ",
            JOB_COLUMNS
        ));
        query.push_bind(user_id.to_string());

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = like_pattern(search);
            query
                .push(" AND (LOWER(job_title) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR LOWER(company) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR LOWER(COALESCE(location, '')) LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        query.push(" ORDER BY updated_at DESC, rowid DESC");

        let jobs = query
            .build_query_as::<Job>()
            .fetch_all(self.pool)
            .await?;

        let mut listed = Vec::with_capacity(jobs.len());
        for job in jobs {
            let status_history = self.history(&job.id, Some(1)).await?;
            listed.push(JobWithHistory {
                job,
                status_history,
            });
        }

        Ok(listed)
    }

    /// A single job with its full history, newest first.
    pub async fn find(&self, user_id: &str, id: &str) -> Result<Option<JobWithHistory>> {
        let job = match self.find_job(user_id, id).await? {
            Some(job) => job,
            None => return Ok(None),
        };

        let status_history = self.history(&job.id, None).await?;
        Ok(Some(JobWithHistory {
            job,
            status_history,
        }))
    }

    /// Apply a partial update; a status change appends a history entry in
    /// the same transaction.
    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        update: JobUpdate,
    ) -> Result<Option<JobWithHistory>> {
        let mut tx = self.pool.begin().await?;

        let mut job = match sqlx::query_as::<_, Job>(&format!(
            "SELECT {} FROM jobs WHERE id = ? AND user_id = ?",
            JOB_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        {
            Some(job) => job,
            None => return Ok(None),
        };

        let previous_status = update.apply_to(&mut job);
        job.updated_at = Utc::now();

        if let Some(previous) = previous_status {
            record_status_change(&mut tx, &job.id, Some(previous), job.status).await?;
            info!(
                "Job {} status changed: {} -> {}",
                job.id, previous, job.status
            );
        }

        sqlx::query(
            r#"
            UPDATE jobs
            SET job_title = ?, company = ?, location = ?, description = ?, status = ?,
                applied_date = ?, notes = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&job.job_title)
        .bind(&job.company)
        .bind(&job.location)
        .bind(&job.description)
        .bind(job.status)
        .bind(job.applied_date)
        .bind(&job.notes)
        .bind(job.updated_at)
        .bind(&job.id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.find(user_id, id).await
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("Deleted job {} for user {}", id, user_id);
        }

        Ok(deleted)
    }

    async fn find_job(&self, user_id: &str, id: &str) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {} FROM jobs WHERE id = ? AND user_id = ?",
            JOB_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(job)
    }

    async fn history(&self, job_id: &str, limit: Option<i64>) -> Result<Vec<StatusChange>> {
        let history = sqlx::query_as::<_, StatusChange>(
            r#"
            SELECT id, job_id, from_status, to_status, changed_at
            FROM job_status_history
            WHERE job_id = ?
            ORDER BY changed_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(job_id)
        .bind(limit.unwrap_or(-1))
        .fetch_all(self.pool)
        .await?;

        Ok(history)
    }
}

async fn record_status_change(
    conn: &mut SqliteConnection,
    job_id: &str,
    from_status: Option<JobStatus>,
    to_status: JobStatus,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO job_status_history (id, job_id, from_status, to_status, changed_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(job_id)
    .bind(from_status)
    .bind(to_status)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(())
}

/// Case-insensitive substring pattern with LIKE wildcards escaped.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> DatabaseConfig {
        let path = std::env::temp_dir().join(format!("job-tracker-test-{}.db", Uuid::new_v4()));
        let mut db = DatabaseConfig::new(path);
        db.init_pool().await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn new_job(title: &str, company: &str, location: Option<&str>) -> NewJob {
        NewJob {
            url: "https://example.com/job/1".to_string(),
            job_title: title.to_string(),
            company: company.to_string(),
            location: location.map(str::to_string),
            description: None,
            status: None,
            applied_date: None,
            notes: None,
        }
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Rust"), "%rust%");
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
    }

    #[tokio::test]
    async fn test_create_records_initial_history() {
        let db = test_db().await;
        let repo = JobRepository::new(db.pool().unwrap());

        let job = repo
            .create("user-1", new_job("Backend Engineer", "BigTech", None), "example.com")
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::Saved);

        let found = repo.find("user-1", &job.id).await.unwrap().unwrap();
        assert_eq!(found.status_history.len(), 1);
        assert_eq!(found.status_history[0].from_status, None);
        assert_eq!(found.status_history[0].to_status, JobStatus::Saved);
    }

    #[tokio::test]
    async fn test_status_change_appends_history() {
        let db = test_db().await;
        let repo = JobRepository::new(db.pool().unwrap());
        let job = repo
            .create("user-1", new_job("Data Scientist", "AI Labs", None), "example.com")
            .await
            .unwrap();

        let update = JobUpdate {
            status: Some(JobStatus::Applied),
            ..Default::default()
        };
        let updated = repo.update("user-1", &job.id, update).await.unwrap().unwrap();

        assert_eq!(updated.job.status, JobStatus::Applied);
        assert_eq!(updated.status_history.len(), 2);
        assert_eq!(updated.status_history[0].from_status, Some(JobStatus::Saved));
        assert_eq!(updated.status_history[0].to_status, JobStatus::Applied);

        // Same status again does not add an entry
        let update = JobUpdate {
            status: Some(JobStatus::Applied),
            notes: Some(Some("sent cover letter".to_string())),
            ..Default::default()
        };
        let updated = repo.update("user-1", &job.id, update).await.unwrap().unwrap();
        assert_eq!(updated.status_history.len(), 2);
        assert_eq!(updated.job.notes.as_deref(), Some("sent cover letter"));
    }

    #[tokio::test]
    async fn test_queries_are_scoped_to_user() {
        let db = test_db().await;
        let repo = JobRepository::new(db.pool().unwrap());
        let job = repo
            .create("user-1", new_job("DevOps Engineer", "CloudCo", None), "example.com")
            .await
            .unwrap();

        assert!(repo.find("user-2", &job.id).await.unwrap().is_none());
        assert!(repo
            .update("user-2", &job.id, JobUpdate::default())
            .await
            .unwrap()
            .is_none());
        assert!(!repo.delete("user-2", &job.id).await.unwrap());
        assert!(repo
            .list("user-2", &JobFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_search() {
        let db = test_db().await;
        let repo = JobRepository::new(db.pool().unwrap());
        repo.create("user-1", new_job("Frontend Engineer", "Tech Corp", Some("Remote")), "example.com")
            .await
            .unwrap();
        let mut applied = new_job("Mobile Developer", "AppWorks", Some("Seattle, WA"));
        applied.status = Some(JobStatus::Applied);
        repo.create("user-1", applied, "example.com").await.unwrap();

        let all = repo.list("user-1", &JobFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|j| j.status_history.len() == 1));

        let by_status = JobFilter {
            status: Some(JobStatus::Applied),
            search: None,
        };
        let listed = repo.list("user-1", &by_status).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].job.company, "AppWorks");

        let by_search = JobFilter {
            status: None,
            search: Some("seattle".to_string()),
        };
        let listed = repo.list("user-1", &by_search).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].job.job_title, "Mobile Developer");
    }

    #[tokio::test]
    async fn test_delete_removes_history() {
        let db = test_db().await;
        let pool = db.pool().unwrap();
        let repo = JobRepository::new(pool);
        let job = repo
            .create("user-1", new_job("QA Engineer", "TestCo", None), "example.com")
            .await
            .unwrap();

        assert!(repo.delete("user-1", &job.id).await.unwrap());
        assert!(repo.find("user-1", &job.id).await.unwrap().is_none());

        let (remaining,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM job_status_history WHERE job_id = ?")
                .bind(&job.id)
                .fetch_one(pool)
                .await
                .unwrap();
        assert_eq!(remaining, 0);
    }
}
