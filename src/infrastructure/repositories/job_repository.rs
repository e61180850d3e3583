use crate::domain::job::{Job, JobState, JobTransition};
use crate::error::{AppError, AppResult};
use crate::infrastructure::db::{check_connection, DbPool};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use uuid::Uuid;

/// Durable record of conversion jobs, keyed by job id.
///
/// Implementations must refuse transitions the state machine does not allow:
/// a rejected transition is reported as `AppError::Conflict`, an unknown id as
/// `AppError::NotFound`. Reads never mutate.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a new job in the `queued` state
    async fn create(&self, job_id: Uuid) -> AppResult<Job>;

    async fn find_by_id(&self, job_id: Uuid) -> AppResult<Option<Job>>;

    /// Move a job forward, returning the updated record
    async fn transition(&self, job_id: Uuid, transition: JobTransition) -> AppResult<Job>;

    /// Readiness probe
    async fn ping(&self) -> AppResult<()>;
}

pub(crate) fn rejected_transition(job: &Job, transition: &JobTransition) -> AppError {
    AppError::Conflict(format!(
        "Job {} cannot move from {} to {}",
        job.id,
        job.state,
        transition.target()
    ))
}

#[derive(Debug, FromRow)]
struct JobRow {
    id: Uuid,
    state: String,
    result_ref: Option<String>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = AppError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        Ok(Job {
            id: row.id,
            state: row.state.parse::<JobState>().map_err(AppError::Internal)?,
            result_ref: row.result_ref,
            error: row.error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL-backed job store
pub struct PgJobRepository {
    pool: Arc<DbPool>,
}

impl PgJobRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn create(&self, job_id: Uuid) -> AppResult<Job> {
        let pool = self.pool.as_ref();
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs (id, state, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            RETURNING id, state, result_ref, error, created_at, updated_at
            "#,
        )
        .bind(job_id)
        .bind(JobState::Queued.as_str())
        .bind(Utc::now())
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(format!("Job {} already exists", job_id));
                }
            }
            AppError::Database(e)
        })?;

        Job::try_from(row)
    }

    async fn find_by_id(&self, job_id: Uuid) -> AppResult<Option<Job>> {
        let pool = self.pool.as_ref();
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, state, result_ref, error, created_at, updated_at
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(pool)
        .await?;

        row.map(Job::try_from).transpose()
    }

    async fn transition(&self, job_id: Uuid, transition: JobTransition) -> AppResult<Job> {
        let pool = self.pool.as_ref();
        let target = transition.target();
        let allowed_from: Vec<String> = target
            .predecessors()
            .iter()
            .map(|state| state.as_str().to_string())
            .collect();

        // Compare-and-set on the current state
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs
            SET state = $2, result_ref = $3, error = $4, updated_at = $5
            WHERE id = $1 AND state = ANY($6)
            RETURNING id, state, result_ref, error, created_at, updated_at
            "#,
        )
        .bind(job_id)
        .bind(target.as_str())
        .bind(transition.result_ref())
        .bind(transition.error())
        .bind(Utc::now())
        .bind(allowed_from)
        .fetch_optional(pool)
        .await?;

        match row {
            Some(row) => Job::try_from(row),
            None => match self.find_by_id(job_id).await? {
                Some(job) => Err(rejected_transition(&job, &transition)),
                None => Err(AppError::NotFound(format!("Job {}", job_id))),
            },
        }
    }

    async fn ping(&self) -> AppResult<()> {
        check_connection(&self.pool).await?;
        Ok(())
    }
}
