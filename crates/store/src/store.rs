//! The persistence contract for job records.

use async_trait::async_trait;

use reelflow_core::job::{Job, JobUpdate, NewJob, QueueType};

use crate::error::StoreError;

/// Persistence operations the orchestration layer depends on.
///
/// Implementations must enforce monotonic status transitions: an update
/// whose status the current status cannot transition to fails with
/// [`StoreError::InvalidTransition`] and leaves the row unchanged.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a new pending job and return the stored record.
    async fn enqueue(&self, new: NewJob) -> Result<Job, StoreError>;

    /// Apply a partial update to one job, enforcing the transition rules.
    async fn update(
        &self,
        project_id: &str,
        job_id: &str,
        update: JobUpdate,
    ) -> Result<Job, StoreError>;

    /// Fetch one job by its composite key.
    async fn get(&self, project_id: &str, job_id: &str) -> Result<Option<Job>, StoreError>;

    /// All jobs of a project, oldest first.
    async fn list_by_project(&self, project_id: &str) -> Result<Vec<Job>, StoreError>;

    /// Atomically claim the oldest pending job of a queue, moving it to
    /// processing. Returns `None` when the queue is empty.
    async fn claim_pending(&self, queue: QueueType) -> Result<Option<Job>, StoreError>;

    /// First-writer-wins completion claim for a project.
    ///
    /// Returns `true` exactly once per project; every later call returns
    /// `false`. The winner is the only caller allowed to fire the
    /// project callback.
    async fn try_claim_completion(&self, project_id: &str) -> Result<bool, StoreError>;
}
