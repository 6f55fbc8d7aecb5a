//! The uniform provider contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use reelflow_core::params::{JobInput, JobOutput};

use crate::error::ProviderError;

// ---------------------------------------------------------------------------
// ExternalRef
// ---------------------------------------------------------------------------

/// Identifier handed back by a provider after `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRef {
    pub id: String,
    /// Output bucket of the render provider; `None` for every other
    /// provider.
    pub bucket: Option<String>,
}

impl ExternalRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            bucket: None,
        }
    }

    pub fn with_bucket(id: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            bucket: Some(bucket.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// StatusProbe
// ---------------------------------------------------------------------------

/// Coarse provider-side state of a started job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Pending,
    Ready,
    Failed,
}

/// Normalized result of one status probe.
///
/// Adapters translate each provider's wire format into this shape so the
/// polling engine can apply uniform terminal predicates.
#[derive(Debug, Clone)]
pub struct StatusProbe {
    pub state: ProbeState,
    pub url: Option<String>,
    pub duration_secs: Option<f64>,
    pub error: Option<String>,
}

impl StatusProbe {
    pub fn pending() -> Self {
        Self {
            state: ProbeState::Pending,
            url: None,
            duration_secs: None,
            error: None,
        }
    }

    pub fn ready(url: Option<String>, duration_secs: Option<f64>) -> Self {
        Self {
            state: ProbeState::Ready,
            url,
            duration_secs,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            state: ProbeState::Failed,
            url: None,
            duration_secs: None,
            error: Some(error.into()),
        }
    }

    /// Terminal success: the provider reports ready and the artifact URL
    /// is present.
    pub fn is_complete(&self) -> bool {
        self.state == ProbeState::Ready && self.url.is_some()
    }

    /// Terminal failure reason, if the provider reported one.
    pub fn failure(&self) -> Option<String> {
        if self.state == ProbeState::Failed {
            Some(
                self.error
                    .clone()
                    .unwrap_or_else(|| "provider reported failure".into()),
            )
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// An asynchronous provider: one `start` call, then status polling until
/// a terminal probe.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Submit the work to the provider. Must be safe to retry on
    /// transient failure.
    async fn start(&self, input: &JobInput) -> Result<ExternalRef, ProviderError>;

    /// Probe the provider for the current state of a started job.
    async fn check_status(&self, external: &ExternalRef) -> Result<StatusProbe, ProviderError>;
}

/// A synchronous provider: a single call produces the terminal output,
/// retried a fixed number of times on transient error. No polling.
#[async_trait]
pub trait DirectProvider: Send + Sync {
    async fn run(&self, input: &JobInput) -> Result<JobOutput, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_without_url_is_not_complete() {
        let probe = StatusProbe::ready(None, None);
        assert!(!probe.is_complete());
    }

    #[test]
    fn ready_with_url_is_complete() {
        let probe = StatusProbe::ready(Some("https://cdn.example/out.mp4".into()), Some(9.0));
        assert!(probe.is_complete());
        assert!(probe.failure().is_none());
    }

    #[test]
    fn failed_probe_reports_reason() {
        let probe = StatusProbe::failed("gpu node crashed");
        assert_eq!(probe.failure().as_deref(), Some("gpu node crashed"));
        assert!(!probe.is_complete());
    }
}
