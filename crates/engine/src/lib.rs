//! Job orchestration: bounded polling, per-job workflows, the
//! narration pipeline, and the per-queue worker pools.

pub mod orchestrator;
pub mod pipeline;
pub mod poller;
pub mod workflow;

pub use orchestrator::Orchestrator;
pub use pipeline::{run_pipeline, PipelineOutput, PipelineParams};
pub use poller::{poll, PollConfig, PollError, Scheduler, TokioScheduler};
pub use workflow::{JobRunner, WorkflowError};
