//! Job enqueue and lookup endpoints.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use reelflow_core::job::{Job, NewJob, QueueType};
use reelflow_core::params::JobInput;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// One enqueue request on the wire.
///
/// Every field is optional at the type level so missing fields produce a
/// 400 with a useful message instead of a rejection from the extractor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueRequest {
    pub project_id: Option<String>,
    pub callback_url: Option<String>,
    pub queue_type: Option<String>,
    pub params: Option<serde_json::Value>,
    #[serde(default)]
    pub slug: Option<String>,
}

/// The enqueue endpoint accepts either a single request or a batch.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EnqueueBody {
    Many(Vec<EnqueueRequest>),
    One(EnqueueRequest),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueResponse {
    pub job_id: String,
    pub status: &'static str,
}

impl EnqueueRequest {
    /// Validate and convert the wire request into a typed [`NewJob`].
    fn into_new_job(self) -> Result<NewJob, AppError> {
        let project_id = required(self.project_id, "projectId")?;
        let callback_url = required(self.callback_url, "callbackUrl")?;
        let queue_type: QueueType = required(self.queue_type, "queueType")?
            .parse()
            .map_err(AppError::Core)?;
        let params = self
            .params
            .ok_or_else(|| AppError::BadRequest("params is required".into()))?;

        let input = JobInput::from_params(queue_type, params)?;
        let new = NewJob {
            project_id,
            callback_url,
            input,
            slug: self.slug,
        };
        new.validate()?;
        Ok(new)
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::BadRequest(format!("{name} is required"))),
    }
}

/// POST /api/v1/jobs -- enqueue one job or a batch.
///
/// Returns the generated job id(s) with status `PENDING`. A batch is
/// all-or-nothing only at the validation stage: each request is
/// validated before any is persisted.
async fn enqueue(
    State(state): State<AppState>,
    Json(body): Json<EnqueueBody>,
) -> AppResult<Response> {
    match body {
        EnqueueBody::One(request) => {
            let new = request.into_new_job()?;
            let job = state.store.enqueue(new).await?;
            tracing::info!(
                project_id = %job.project_id,
                job_id = %job.job_id,
                queue = %job.queue_type,
                "job enqueued"
            );
            Ok(Json(EnqueueResponse {
                job_id: job.job_id,
                status: "PENDING",
            })
            .into_response())
        }
        EnqueueBody::Many(requests) => {
            let mut new_jobs = Vec::with_capacity(requests.len());
            for request in requests {
                new_jobs.push(request.into_new_job()?);
            }

            let mut responses = Vec::with_capacity(new_jobs.len());
            for new in new_jobs {
                let job = state.store.enqueue(new).await?;
                tracing::info!(
                    project_id = %job.project_id,
                    job_id = %job.job_id,
                    queue = %job.queue_type,
                    "job enqueued"
                );
                responses.push(EnqueueResponse {
                    job_id: job.job_id,
                    status: "PENDING",
                });
            }
            Ok(Json(responses).into_response())
        }
    }
}

/// GET /api/v1/projects/{project_id}/jobs -- list a project's jobs.
async fn list_project_jobs(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> AppResult<Json<Vec<Job>>> {
    let jobs = state.store.list_by_project(&project_id).await?;
    Ok(Json(jobs))
}

/// GET /api/v1/projects/{project_id}/jobs/{job_id} -- fetch one job.
async fn get_job(
    State(state): State<AppState>,
    Path((project_id, job_id)): Path<(String, String)>,
) -> AppResult<Json<Job>> {
    let job = state
        .store
        .get(&project_id, &job_id)
        .await?
        .ok_or(AppError::Store(reelflow_store::StoreError::NotFound {
            project_id,
            job_id,
        }))?;
    Ok(Json(job))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jobs", post(enqueue))
        .route("/projects/{project_id}/jobs", get(list_project_jobs))
        .route("/projects/{project_id}/jobs/{job_id}", get(get_job))
}
