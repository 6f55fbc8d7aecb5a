//! Job records and their lifecycle.
//!
//! A [`Job`] is one request to an external generation, rendering, or
//! transcription provider, keyed by `(project_id, job_id)`. All jobs
//! sharing a `project_id` form an implicit project that completes when
//! every sibling reaches [`JobStatus::Ready`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::params::{JobInput, JobOutput};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Lifecycle states of a job.
///
/// `Ready`, `Error`, and `Failed` are terminal; transitions are monotonic
/// and a terminal state never reverts. `Error` records an
/// orchestration-side failure (polling timeout, non-retryable provider
/// error), `Failed` a failure reported by the provider itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Ready,
    Error,
    Failed,
}

impl JobStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Ready | JobStatus::Error | JobStatus::Failed)
    }

    /// Whether `self -> next` is an allowed transition.
    ///
    /// Re-asserting the current status is always allowed (updates are
    /// idempotent); otherwise the job may only move forward:
    /// pending -> processing -> {ready | error | failed}.
    pub fn can_transition(self, next: JobStatus) -> bool {
        self == next || (!self.is_terminal() && next.rank() > self.rank())
    }

    fn rank(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Processing => 1,
            JobStatus::Ready | JobStatus::Error | JobStatus::Failed => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Ready => "ready",
            JobStatus::Error => "error",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "ready" => Ok(JobStatus::Ready),
            "error" => Ok(JobStatus::Error),
            "failed" => Ok(JobStatus::Failed),
            other => Err(CoreError::Validation(format!(
                "Unknown job status: \"{other}\""
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// QueueType
// ---------------------------------------------------------------------------

/// Closed set of provider queues.
///
/// Each variant maps to exactly one provider adapter; unknown strings are
/// rejected at enqueue time, never at workflow start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueType {
    AvatarSynthesis,
    ImageSynthesis,
    VideoSynthesis,
    Render,
    Transcription,
    BackgroundRemoval,
}

impl QueueType {
    /// Every queue, in dispatch order. Used to spawn one pool per queue.
    pub const ALL: [QueueType; 6] = [
        QueueType::AvatarSynthesis,
        QueueType::ImageSynthesis,
        QueueType::VideoSynthesis,
        QueueType::Render,
        QueueType::Transcription,
        QueueType::BackgroundRemoval,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QueueType::AvatarSynthesis => "avatar-synthesis",
            QueueType::ImageSynthesis => "image-synthesis",
            QueueType::VideoSynthesis => "video-synthesis",
            QueueType::Render => "render",
            QueueType::Transcription => "transcription",
            QueueType::BackgroundRemoval => "background-removal",
        }
    }
}

impl fmt::Display for QueueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "avatar-synthesis" => Ok(QueueType::AvatarSynthesis),
            "image-synthesis" => Ok(QueueType::ImageSynthesis),
            "video-synthesis" => Ok(QueueType::VideoSynthesis),
            "render" => Ok(QueueType::Render),
            "transcription" => Ok(QueueType::Transcription),
            "background-removal" => Ok(QueueType::BackgroundRemoval),
            other => Err(CoreError::Validation(format!(
                "Unknown queue type: \"{other}\""
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// A persisted job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub project_id: String,
    pub job_id: String,
    pub status: JobStatus,
    pub queue_type: QueueType,
    /// Identifier assigned by the external provider after `start`.
    pub external_id: Option<String>,
    /// Provider-start attempts (not poll attempts).
    pub attempts: i32,
    pub input: JobInput,
    pub output: Option<JobOutput>,
    /// Convenience projection of `output` for the terminal artifact.
    pub output_url: Option<String>,
    /// Convenience projection of `output` for the artifact duration.
    pub duration_secs: Option<f64>,
    pub slug: Option<String>,
    /// Shared across all jobs of the same project.
    pub callback_url: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Job {
    /// Construct a fresh pending record from a validated enqueue request.
    ///
    /// Generates a new `job_id` (UUID v4) and stamps both timestamps.
    pub fn from_new(new: NewJob) -> Self {
        let now = chrono::Utc::now();
        Self {
            project_id: new.project_id,
            job_id: uuid::Uuid::new_v4().to_string(),
            status: JobStatus::Pending,
            queue_type: new.input.queue_type(),
            external_id: None,
            attempts: 0,
            input: new.input,
            output: None,
            output_url: None,
            duration_secs: None,
            slug: new.slug,
            callback_url: new.callback_url,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update in place and bump `updated_at`.
    ///
    /// Transition validity must be checked by the caller beforehand via
    /// [`JobStatus::can_transition`].
    pub fn apply(&mut self, update: JobUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(external_id) = update.external_id {
            self.external_id = Some(external_id);
        }
        if let Some(attempts) = update.attempts {
            self.attempts = attempts;
        }
        if let Some(output) = update.output {
            self.output = Some(output);
        }
        if let Some(output_url) = update.output_url {
            self.output_url = Some(output_url);
        }
        if let Some(duration_secs) = update.duration_secs {
            self.duration_secs = Some(duration_secs);
        }
        self.updated_at = chrono::Utc::now();
    }
}

// ---------------------------------------------------------------------------
// NewJob / JobUpdate
// ---------------------------------------------------------------------------

/// A validated enqueue request, ready to persist.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub project_id: String,
    pub callback_url: String,
    pub input: JobInput,
    pub slug: Option<String>,
}

impl NewJob {
    /// Enqueue-time validation: project, callback, and params must all be
    /// present. Typed `input` guarantees params are structurally valid.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.project_id.trim().is_empty() {
            return Err(CoreError::Validation("projectId is required".into()));
        }
        if self.callback_url.trim().is_empty() {
            return Err(CoreError::Validation("callbackUrl is required".into()));
        }
        Ok(())
    }
}

/// Partial update of a job row. Unset fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub external_id: Option<String>,
    pub attempts: Option<i32>,
    pub output: Option<JobOutput>,
    pub output_url: Option<String>,
    pub duration_secs: Option<f64>,
}

impl JobUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn with_attempts(mut self, attempts: i32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    /// Attach the terminal output, projecting `output_url` and
    /// `duration_secs` from it.
    pub fn with_output(mut self, output: JobOutput) -> Self {
        self.output_url = output.url().map(str::to_string);
        self.duration_secs = output.duration_secs();
        self.output = Some(output);
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
