//! Store-level errors.

use thiserror::Error;

use reelflow_core::error::CoreError;
use reelflow_core::job::JobStatus;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("job not found: {project_id}/{job_id}")]
    NotFound { project_id: String, job_id: String },

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
