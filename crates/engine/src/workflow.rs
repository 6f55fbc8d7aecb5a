//! Per-job execution: start the provider, poll to a terminal state, and
//! persist the outcome.
//!
//! A provider-reported failure lands the job in `failed`; an
//! orchestration failure (start exhaustion, polling timeout, permanent
//! provider error) lands it in `error`. Either way the terminal
//! transition triggers a completion check for the job's project.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use thiserror::Error;
use tracing::{info, warn};

use reelflow_core::config::{OrchestratorConfig, TimingConfig};
use reelflow_core::job::{Job, JobStatus, JobUpdate, QueueType};
use reelflow_core::params::{JobInput, JobOutput};
use reelflow_providers::{
    DirectProvider, ExternalRef, Provider, ProviderAdapter, ProviderError, ProviderRegistry,
    StatusProbe,
};
use reelflow_store::{CompletionAggregator, JobStore, StoreError};

use crate::poller::{poll, PollConfig, PollError, Scheduler};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("provider start failed: {0}")]
    Start(#[source] ProviderError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error("direct provider call failed: {0}")]
    Direct(#[source] ProviderError),

    #[error("no provider registered for queue: {0}")]
    UnknownQueue(QueueType),
}

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

/// Start a job at its provider, retrying transient failures.
///
/// Each attempt is bounded by `start_to_close`; a permanent error or an
/// exhausted budget gives up immediately.
pub(crate) async fn start_with_retries(
    adapter: &dyn ProviderAdapter,
    input: &JobInput,
    timing: &TimingConfig,
    scheduler: &dyn Scheduler,
) -> Result<ExternalRef, WorkflowError> {
    let retries = timing.start_retries.max(1);
    for attempt in 1..=retries {
        let result = match tokio::time::timeout(timing.start_to_close, adapter.start(input)).await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                after: timing.start_to_close,
            }),
        };

        match result {
            Ok(external) => return Ok(external),
            Err(err) if err.is_permanent() || attempt == retries => {
                return Err(WorkflowError::Start(err));
            }
            Err(err) => {
                warn!(attempt, retries, error = %err, "provider start failed, retrying");
                scheduler.sleep(timing.start_retry_delay).await;
            }
        }
    }
    unreachable!("retry loop returns on its last attempt")
}

/// Probe the provider until the work is complete, failed, or the poll
/// budget runs out. Each probe is individually time-bounded.
pub(crate) async fn poll_until_terminal(
    adapter: Arc<dyn ProviderAdapter>,
    external: ExternalRef,
    poll_config: PollConfig,
    probe_timeout: Duration,
    scheduler: &dyn Scheduler,
) -> Result<StatusProbe, PollError> {
    poll(
        move || {
            let adapter = adapter.clone();
            let external = external.clone();
            async move {
                match tokio::time::timeout(probe_timeout, adapter.check_status(&external)).await {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout {
                        after: probe_timeout,
                    }),
                }
            }
            .boxed()
        },
        StatusProbe::is_complete,
        StatusProbe::failure,
        ProviderError::is_permanent,
        poll_config,
        scheduler,
    )
    .await
}

/// Run a synchronous provider with a small fixed retry budget.
pub(crate) async fn run_direct(
    provider: &dyn DirectProvider,
    input: &JobInput,
    timing: &TimingConfig,
    scheduler: &dyn Scheduler,
) -> Result<JobOutput, WorkflowError> {
    let retries = timing.direct_retries.max(1);
    for attempt in 1..=retries {
        match provider.run(input).await {
            Ok(output) => return Ok(output),
            Err(err) if err.is_permanent() || attempt == retries => {
                return Err(WorkflowError::Direct(err));
            }
            Err(err) => {
                warn!(attempt, retries, error = %err, "direct provider failed, retrying");
                scheduler.sleep(timing.start_retry_delay).await;
            }
        }
    }
    unreachable!("retry loop returns on its last attempt")
}

// ---------------------------------------------------------------------------
// JobRunner
// ---------------------------------------------------------------------------

/// Executes one claimed job end to end and records the outcome.
pub struct JobRunner {
    store: Arc<dyn JobStore>,
    registry: Arc<ProviderRegistry>,
    aggregator: Arc<CompletionAggregator>,
    scheduler: Arc<dyn Scheduler>,
    config: OrchestratorConfig,
}

impl JobRunner {
    pub fn new(
        store: Arc<dyn JobStore>,
        registry: Arc<ProviderRegistry>,
        aggregator: Arc<CompletionAggregator>,
        scheduler: Arc<dyn Scheduler>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            registry,
            aggregator,
            scheduler,
            config,
        }
    }

    /// Drive a claimed job to a terminal status.
    ///
    /// Provider and polling failures are absorbed into the stored
    /// terminal status; only store failures surface as errors.
    pub async fn run(&self, job: Job) -> Result<JobStatus, WorkflowError> {
        info!(
            project_id = %job.project_id,
            job_id = %job.job_id,
            queue = %job.queue_type,
            "running job"
        );

        self.store
            .update(
                &job.project_id,
                &job.job_id,
                JobUpdate::new().with_attempts(job.attempts + 1),
            )
            .await?;

        let outcome = match self.registry.get(job.queue_type) {
            Some(Provider::Polled(adapter)) => self.run_polled(&job, adapter.clone()).await,
            Some(Provider::Direct(provider)) => {
                run_direct(
                    provider.as_ref(),
                    &job.input,
                    &self.config.timing,
                    self.scheduler.as_ref(),
                )
                .await
            }
            None => Err(WorkflowError::UnknownQueue(job.queue_type)),
        };

        let status = match outcome {
            Ok(output) => {
                self.store
                    .update(
                        &job.project_id,
                        &job.job_id,
                        JobUpdate::new()
                            .with_status(JobStatus::Ready)
                            .with_output(output),
                    )
                    .await?;
                JobStatus::Ready
            }
            Err(WorkflowError::Store(err)) => return Err(WorkflowError::Store(err)),
            Err(err) => {
                let status = match &err {
                    WorkflowError::Poll(PollError::Failed(_)) => JobStatus::Failed,
                    _ => JobStatus::Error,
                };
                warn!(
                    project_id = %job.project_id,
                    job_id = %job.job_id,
                    error = %err,
                    status = %status,
                    "job did not complete"
                );
                self.store
                    .update(
                        &job.project_id,
                        &job.job_id,
                        JobUpdate::new().with_status(status).with_output(
                            JobOutput::Failure {
                                error: err.to_string(),
                            },
                        ),
                    )
                    .await?;
                status
            }
        };

        // Every terminal transition may have completed the project.
        if let Err(err) = self.aggregator.notify_if_complete(&job.project_id).await {
            warn!(
                project_id = %job.project_id,
                error = %err,
                "completion check failed"
            );
        }

        Ok(status)
    }

    async fn run_polled(
        &self,
        job: &Job,
        adapter: Arc<dyn ProviderAdapter>,
    ) -> Result<JobOutput, WorkflowError> {
        let external = start_with_retries(
            adapter.as_ref(),
            &job.input,
            &self.config.timing,
            self.scheduler.as_ref(),
        )
        .await?;

        self.store
            .update(
                &job.project_id,
                &job.job_id,
                JobUpdate::new().with_external_id(external.id.clone()),
            )
            .await?;

        let probe = poll_until_terminal(
            adapter,
            external,
            PollConfig {
                interval: self.config.poll.interval,
                max_attempts: self.config.poll.max_attempts,
            },
            self.config.timing.start_to_close,
            self.scheduler.as_ref(),
        )
        .await?;

        Ok(match job.queue_type {
            QueueType::Render => JobOutput::Render {
                video_url: probe.url.unwrap_or_default(),
            },
            _ => JobOutput::Media {
                url: probe.url.unwrap_or_default(),
                duration_secs: probe.duration_secs,
            },
        })
    }
}
