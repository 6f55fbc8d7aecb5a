//! Shared test doubles for the engine tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use reelflow_core::params::{JobInput, JobOutput};
use reelflow_engine::Scheduler;
use reelflow_providers::{
    DirectProvider, ExternalRef, ProviderAdapter, ProviderError, StatusProbe,
};

/// Scheduler that returns immediately, so polling loops run at full speed.
pub struct NoopScheduler;

#[async_trait]
impl Scheduler for NoopScheduler {
    async fn sleep(&self, _duration: Duration) {}
}

/// Scripted provider adapter.
///
/// `start` and `check_status` pop from their scripts in order; an empty
/// probe script keeps answering pending.
#[derive(Default)]
pub struct FakeAdapter {
    pub start_calls: AtomicU32,
    pub probe_calls: AtomicU32,
    start_script: Mutex<VecDeque<Result<ExternalRef, ProviderError>>>,
    probe_script: Mutex<VecDeque<StatusProbe>>,
    pub last_input: Mutex<Option<JobInput>>,
}

impl FakeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_start(&self, result: Result<ExternalRef, ProviderError>) {
        self.start_script.lock().unwrap().push_back(result);
    }

    pub fn push_probe(&self, probe: StatusProbe) {
        self.probe_script.lock().unwrap().push_back(probe);
    }

    /// Adapter that starts cleanly and reports ready on the first probe.
    pub fn immediate_success(url: &str) -> Self {
        let adapter = Self::new();
        adapter.push_start(Ok(ExternalRef::new("ext-1")));
        adapter.push_probe(StatusProbe::ready(Some(url.into()), Some(10.0)));
        adapter
    }
}

#[async_trait]
impl ProviderAdapter for FakeAdapter {
    async fn start(&self, input: &JobInput) -> Result<ExternalRef, ProviderError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = Some(input.clone());
        self.start_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(ExternalRef::new("ext-default")))
    }

    async fn check_status(&self, _external: &ExternalRef) -> Result<StatusProbe, ProviderError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .probe_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(StatusProbe::pending))
    }
}

/// Scripted synchronous provider.
#[derive(Default)]
pub struct FakeDirect {
    pub calls: AtomicU32,
    script: Mutex<VecDeque<Result<JobOutput, ProviderError>>>,
}

impl FakeDirect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: Result<JobOutput, ProviderError>) {
        self.script.lock().unwrap().push_back(result);
    }
}

#[async_trait]
impl DirectProvider for FakeDirect {
    async fn run(&self, _input: &JobInput) -> Result<JobOutput, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(JobOutput::Transcript {
                transcript: String::new(),
                words: Vec::new(),
            }))
    }
}
