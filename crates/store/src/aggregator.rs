//! Project completion aggregation.
//!
//! Every terminal job transition asks the aggregator whether its project
//! is now fully ready. The first caller to observe a fully-ready project
//! wins the completion claim and fires the single project callback;
//! concurrent siblings finishing at the same instant lose the claim and
//! do nothing.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use reelflow_core::job::{Job, JobStatus};

use crate::error::StoreError;
use crate::store::JobStore;

#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("callback delivery failed: {0}")]
    Delivery(#[from] reqwest::Error),
}

/// Snapshot of a project's completion state.
#[derive(Debug)]
pub struct CompletionCheck {
    pub all_ready: bool,
    pub callback_url: String,
    pub jobs: Vec<Job>,
}

/// Body POSTed to the project callback URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CallbackPayload<'a> {
    project_id: &'a str,
    jobs: &'a [Job],
}

pub struct CompletionAggregator {
    store: Arc<dyn JobStore>,
    http: reqwest::Client,
}

impl CompletionAggregator {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self {
            store,
            http: reqwest::Client::new(),
        }
    }

    /// Inspect the project's siblings without claiming anything.
    ///
    /// `all_ready` is true only when the project has at least one job and
    /// every job is [`JobStatus::Ready`]. A failed or errored sibling
    /// blocks completion permanently.
    pub async fn check(&self, project_id: &str) -> Result<CompletionCheck, AggregatorError> {
        let jobs = self.store.list_by_project(project_id).await?;
        let all_ready =
            !jobs.is_empty() && jobs.iter().all(|job| job.status == JobStatus::Ready);
        let callback_url = jobs
            .first()
            .map(|job| job.callback_url.clone())
            .unwrap_or_default();
        Ok(CompletionCheck {
            all_ready,
            callback_url,
            jobs,
        })
    }

    /// Fire the project callback if every sibling is ready and this
    /// caller wins the completion claim.
    ///
    /// Returns `Ok(true)` only for the single invocation that delivered
    /// the callback. A non-2xx callback response is logged, not retried;
    /// the claim stays spent either way.
    pub async fn notify_if_complete(&self, project_id: &str) -> Result<bool, AggregatorError> {
        let check = self.check(project_id).await?;
        if !check.all_ready {
            return Ok(false);
        }

        if !self.store.try_claim_completion(project_id).await? {
            debug!(project_id, "completion already claimed by a sibling");
            return Ok(false);
        }

        info!(
            project_id,
            jobs = check.jobs.len(),
            callback_url = %check.callback_url,
            "project complete, delivering callback"
        );

        let response = self
            .http
            .post(&check.callback_url)
            .json(&CallbackPayload {
                project_id,
                jobs: &check.jobs,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(
                project_id,
                status = response.status().as_u16(),
                "callback endpoint returned an error"
            );
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use reelflow_core::job::{JobUpdate, NewJob};
    use reelflow_core::params::{AvatarParams, ImageParams, JobInput};

    use crate::memory::MemoryJobStore;

    use super::*;

    fn new_job(project: &str, input: JobInput) -> NewJob {
        NewJob {
            project_id: project.into(),
            callback_url: "https://cb.example/hook".into(),
            input,
            slug: None,
        }
    }

    fn avatar_input() -> JobInput {
        JobInput::AvatarSynthesis(AvatarParams {
            script: "hi".into(),
            avatar_id: "a".into(),
            voice_id: "v".into(),
        })
    }

    fn image_input() -> JobInput {
        JobInput::ImageSynthesis(ImageParams {
            prompt: "a cat".into(),
            width: None,
            height: None,
            style: None,
        })
    }

    async fn mark_ready(store: &MemoryJobStore, job: &Job) {
        store
            .update(
                &job.project_id,
                &job.job_id,
                JobUpdate::new().with_status(JobStatus::Ready),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_project_is_not_complete() {
        let store = Arc::new(MemoryJobStore::new());
        let aggregator = CompletionAggregator::new(store);
        let check = aggregator.check("missing").await.unwrap();
        assert!(!check.all_ready);
        assert!(check.jobs.is_empty());
    }

    #[tokio::test]
    async fn single_job_project_completes_when_ready() {
        let store = Arc::new(MemoryJobStore::new());
        let job = store.enqueue(new_job("p1", avatar_input())).await.unwrap();
        let aggregator = CompletionAggregator::new(store.clone());

        assert!(!aggregator.check("p1").await.unwrap().all_ready);
        mark_ready(&store, &job).await;
        let check = aggregator.check("p1").await.unwrap();
        assert!(check.all_ready);
        assert_eq!(check.callback_url, "https://cb.example/hook");
    }

    #[tokio::test]
    async fn pending_sibling_blocks_completion() {
        let store = Arc::new(MemoryJobStore::new());
        let done = store.enqueue(new_job("p1", avatar_input())).await.unwrap();
        let _waiting = store.enqueue(new_job("p1", image_input())).await.unwrap();
        mark_ready(&store, &done).await;

        let aggregator = CompletionAggregator::new(store);
        assert!(!aggregator.check("p1").await.unwrap().all_ready);
    }

    #[tokio::test]
    async fn errored_sibling_blocks_completion() {
        let store = Arc::new(MemoryJobStore::new());
        let done = store.enqueue(new_job("p1", avatar_input())).await.unwrap();
        let broken = store.enqueue(new_job("p1", image_input())).await.unwrap();
        mark_ready(&store, &done).await;
        store
            .update(
                "p1",
                &broken.job_id,
                JobUpdate::new().with_status(JobStatus::Error),
            )
            .await
            .unwrap();

        let aggregator = CompletionAggregator::new(store);
        assert!(!aggregator.check("p1").await.unwrap().all_ready);
    }

    #[tokio::test]
    async fn incomplete_project_never_claims() {
        let store = Arc::new(MemoryJobStore::new());
        let _waiting = store.enqueue(new_job("p1", avatar_input())).await.unwrap();

        let aggregator = CompletionAggregator::new(store.clone());
        assert!(!aggregator.notify_if_complete("p1").await.unwrap());
        // The claim must still be available for the real completion.
        assert!(store.try_claim_completion("p1").await.unwrap());
    }
}
