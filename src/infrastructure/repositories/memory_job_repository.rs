use super::job_repository::{rejected_transition, JobRepository};
use crate::domain::job::{Job, JobTransition};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local job store, used when no database is configured.
/// Jobs do not survive a restart.
#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, job_id: Uuid) -> AppResult<Job> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job_id) {
            return Err(AppError::Conflict(format!("Job {} already exists", job_id)));
        }

        let job = Job::queued(job_id);
        jobs.insert(job_id, job.clone());
        Ok(job)
    }

    async fn find_by_id(&self, job_id: Uuid) -> AppResult<Option<Job>> {
        Ok(self.jobs.read().await.get(&job_id).cloned())
    }

    async fn transition(&self, job_id: Uuid, transition: JobTransition) -> AppResult<Job> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| AppError::NotFound(format!("Job {}", job_id)))?;

        let rejected = rejected_transition(job, &transition);
        job.apply(transition).map_err(|_| rejected)?;
        Ok(job.clone())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
