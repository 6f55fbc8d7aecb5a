//! Worker pools: one bounded pool per queue.
//!
//! Each pool claims pending jobs of its queue and runs them concurrently
//! up to the queue's cap. Claims use the store's atomic claim, so any
//! number of pools (or processes) can share one database safely.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use reelflow_core::config::OrchestratorConfig;
use reelflow_core::job::QueueType;
use reelflow_store::JobStore;

use crate::workflow::JobRunner;

pub struct Orchestrator {
    store: Arc<dyn JobStore>,
    runner: Arc<JobRunner>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn JobStore>,
        runner: Arc<JobRunner>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            runner,
            config,
        }
    }

    /// Run one pool per queue until the cancellation token fires, then
    /// drain in-flight jobs.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut pools = Vec::new();
        for queue in QueueType::ALL {
            let cap = self.config.pool_caps.for_queue(queue);
            if cap == 0 {
                warn!(queue = %queue, "pool disabled by zero cap");
                continue;
            }
            pools.push(self.run_pool(queue, cap, cancel.clone()));
        }
        futures::future::join_all(pools).await;
        info!("all pools drained");
    }

    async fn run_pool(&self, queue: QueueType, cap: u32, cancel: CancellationToken) {
        info!(queue = %queue, cap, "pool started");
        let semaphore = Arc::new(Semaphore::new(cap as usize));

        loop {
            if cancel.is_cancelled() {
                break;
            }

            // Waiting for a slot before claiming keeps claimed jobs from
            // sitting idle behind a full pool.
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            match self.store.claim_pending(queue).await {
                Ok(Some(job)) => {
                    let runner = self.runner.clone();
                    tokio::spawn(async move {
                        let project_id = job.project_id.clone();
                        let job_id = job.job_id.clone();
                        if let Err(e) = runner.run(job).await {
                            error!(
                                project_id = %project_id,
                                job_id = %job_id,
                                error = %e,
                                "job execution failed"
                            );
                        }
                        drop(permit);
                    });
                }
                Ok(None) => {
                    drop(permit);
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.config.timing.idle_backoff) => {}
                    }
                }
                Err(e) => {
                    drop(permit);
                    error!(queue = %queue, error = %e, "claim failed");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.config.timing.idle_backoff) => {}
                    }
                }
            }
        }

        // Drain: wait until every permit is back.
        let _ = semaphore.acquire_many(cap).await;
        info!(queue = %queue, "pool stopped");
    }
}
