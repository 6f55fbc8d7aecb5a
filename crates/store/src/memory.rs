//! In-memory [`JobStore`] used by tests and local development.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use reelflow_core::job::{Job, JobStatus, JobUpdate, NewJob, QueueType};

use crate::error::StoreError;
use crate::store::JobStore;

#[derive(Default)]
struct Inner {
    jobs: HashMap<(String, String), Job>,
    /// Enqueue order, so claim_pending picks the oldest first.
    order: Vec<(String, String)>,
    completed_projects: HashSet<String>,
}

/// Lock-guarded map keyed by `(project_id, job_id)`.
#[derive(Default)]
pub struct MemoryJobStore {
    inner: RwLock<Inner>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn enqueue(&self, new: NewJob) -> Result<Job, StoreError> {
        new.validate()?;
        let job = Job::from_new(new);
        let key = (job.project_id.clone(), job.job_id.clone());
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.order.push(key.clone());
        inner.jobs.insert(key, job.clone());
        Ok(job)
    }

    async fn update(
        &self,
        project_id: &str,
        job_id: &str,
        update: JobUpdate,
    ) -> Result<Job, StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let job = inner
            .jobs
            .get_mut(&(project_id.to_string(), job_id.to_string()))
            .ok_or_else(|| StoreError::NotFound {
                project_id: project_id.to_string(),
                job_id: job_id.to_string(),
            })?;

        if let Some(next) = update.status {
            if !job.status.can_transition(next) {
                return Err(StoreError::InvalidTransition {
                    from: job.status,
                    to: next,
                });
            }
        }

        job.apply(update);
        Ok(job.clone())
    }

    async fn get(&self, project_id: &str, job_id: &str) -> Result<Option<Job>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Ok(inner
            .jobs
            .get(&(project_id.to_string(), job_id.to_string()))
            .cloned())
    }

    async fn list_by_project(&self, project_id: &str) -> Result<Vec<Job>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Ok(inner
            .order
            .iter()
            .filter(|(p, _)| p == project_id)
            .filter_map(|key| inner.jobs.get(key))
            .cloned()
            .collect())
    }

    async fn claim_pending(&self, queue: QueueType) -> Result<Option<Job>, StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let key = inner
            .order
            .iter()
            .find(|key| {
                inner
                    .jobs
                    .get(*key)
                    .is_some_and(|j| j.status == JobStatus::Pending && j.queue_type == queue)
            })
            .cloned();

        let Some(key) = key else {
            return Ok(None);
        };
        let job = inner
            .jobs
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound {
                project_id: key.0.clone(),
                job_id: key.1.clone(),
            })?;
        job.apply(JobUpdate::new().with_status(JobStatus::Processing));
        Ok(Some(job.clone()))
    }

    async fn try_claim_completion(&self, project_id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        Ok(inner.completed_projects.insert(project_id.to_string()))
    }
}
