//! Generic bounded polling.
//!
//! Drives any "probe until terminal" interaction: probe, inspect, sleep,
//! repeat, up to a fixed attempt budget. Sleeping goes through the
//! [`Scheduler`] seam so tests run the full loop without real delays.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use thiserror::Error;
use tracing::debug;

use reelflow_providers::ProviderError;

/// Sleep capability injected into the polling loop.
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production scheduler backed by the tokio timer.
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Delay between consecutive probes.
    pub interval: Duration,
    /// Probe budget; exhausting it is a timeout.
    pub max_attempts: u32,
}

#[derive(Debug, Error)]
pub enum PollError {
    /// The provider reported the work itself failed.
    #[error("provider reported failure: {0}")]
    Failed(String),

    /// A probe returned an error the caller deemed non-retryable.
    #[error("polling aborted")]
    Aborted(#[source] ProviderError),

    /// The attempt budget ran out before a terminal state.
    #[error("polling timed out after {attempts} attempts")]
    Timeout { attempts: u32 },
}

/// Poll `check` until `is_done`, `failure_of`, or the budget decides.
///
/// Each iteration runs one probe. A probe error is retried unless
/// `abort_on` says otherwise; a successful probe is terminal when
/// `is_done` or `failure_of` says so. Exactly `max_attempts` probes run
/// in the worst case, with a sleep between consecutive probes but none
/// after the last.
pub async fn poll<'a, T>(
    mut check: impl FnMut() -> BoxFuture<'a, Result<T, ProviderError>> + 'a,
    is_done: impl Fn(&T) -> bool,
    failure_of: impl Fn(&T) -> Option<String>,
    abort_on: impl Fn(&ProviderError) -> bool,
    config: PollConfig,
    scheduler: &dyn Scheduler,
) -> Result<T, PollError> {
    let max_attempts = config.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match check().await {
            Ok(state) => {
                if is_done(&state) {
                    return Ok(state);
                }
                if let Some(reason) = failure_of(&state) {
                    return Err(PollError::Failed(reason));
                }
                debug!(attempt, max_attempts, "still pending");
            }
            Err(err) if abort_on(&err) => return Err(PollError::Aborted(err)),
            Err(err) => {
                debug!(attempt, max_attempts, error = %err, "probe failed, will retry");
            }
        }

        if attempt < max_attempts {
            scheduler.sleep(config.interval).await;
        }
    }

    Err(PollError::Timeout {
        attempts: max_attempts,
    })
}
