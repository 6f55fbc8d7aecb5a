//! The captioned-narration pipeline.
//!
//! Three sequential stages, each feeding the next:
//!   1. avatar narration synthesis (polled),
//!   2. transcription of the narration (synchronous),
//!   3. captioned render over the narration (polled).
//!
//! A stage failure aborts the pipeline; later stages never run and
//! artifacts from completed stages are kept.

use tracing::info;

use reelflow_core::config::OrchestratorConfig;
use reelflow_core::job::QueueType;
use reelflow_core::params::{
    AvatarParams, JobInput, JobOutput, RenderInputProps, RenderParams, TranscriptionParams, Word,
};
use reelflow_providers::{Provider, ProviderRegistry};

use crate::poller::{PollConfig, Scheduler};
use crate::workflow::{poll_until_terminal, run_direct, start_with_retries, WorkflowError};

/// Default composition rendered by the pipeline.
const DEFAULT_COMPOSITION: &str = "captioned-video";

/// Everything the pipeline needs, flattened for callers.
#[derive(Debug, Clone)]
pub struct PipelineParams {
    pub script: String,
    pub avatar_id: String,
    pub voice_id: String,
    pub hook: Option<String>,
    pub background_url: Option<String>,
    pub color: Option<String>,
    pub position: Option<String>,
    pub size: Option<f64>,
    pub language: Option<String>,
    pub composition: Option<String>,
}

/// Final artifact of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub video_url: String,
    pub captions: Vec<Word>,
    pub duration_secs: Option<f64>,
}

/// Run the full narration pipeline to completion.
///
/// This is a library entry point for embedding callers that own their
/// scheduling; the queue-driven worker runs each stage as an ordinary
/// job instead of going through this function.
pub async fn run_pipeline(
    registry: &ProviderRegistry,
    config: &OrchestratorConfig,
    scheduler: &dyn Scheduler,
    params: PipelineParams,
) -> Result<PipelineOutput, WorkflowError> {
    let poll_config = PollConfig {
        interval: config.poll.interval,
        max_attempts: config.poll.max_attempts,
    };

    // Stage 1: narration.
    let narration_input = JobInput::AvatarSynthesis(AvatarParams {
        script: params.script.clone(),
        avatar_id: params.avatar_id.clone(),
        voice_id: params.voice_id.clone(),
    });
    let (narration_url, narration_duration) = run_polled_stage(
        registry,
        config,
        scheduler,
        poll_config,
        QueueType::AvatarSynthesis,
        &narration_input,
    )
    .await?;
    info!(url = %narration_url, "narration stage complete");

    // Stage 2: transcription of the narration.
    let transcription_input = JobInput::Transcription(TranscriptionParams {
        video_url: narration_url.clone(),
        language: params.language.clone().unwrap_or_else(|| "en".into()),
        model: "general".into(),
        punctuate: true,
        keywords: Vec::new(),
    });
    let provider = registry
        .get(QueueType::Transcription)
        .ok_or(WorkflowError::UnknownQueue(QueueType::Transcription))?;
    let Provider::Direct(direct) = provider else {
        return Err(WorkflowError::UnknownQueue(QueueType::Transcription));
    };
    let transcript = run_direct(
        direct.as_ref(),
        &transcription_input,
        &config.timing,
        scheduler,
    )
    .await?;
    let words = match transcript {
        JobOutput::Transcript { words, .. } => words,
        _ => Vec::new(),
    };
    info!(words = words.len(), "transcription stage complete");

    // Stage 3: captioned render over the narration.
    let render_input = JobInput::Render(RenderParams {
        composition: params
            .composition
            .unwrap_or_else(|| DEFAULT_COMPOSITION.into()),
        input_props: RenderInputProps {
            hook: params.hook,
            background_url: params.background_url,
            overlay_url: Some(narration_url),
            duration_secs: narration_duration,
            captions: words.clone(),
            color: params.color,
            position: params.position,
            size: params.size,
        },
        width: 1080,
        height: 1920,
        fps: 30,
    });
    let (video_url, _) = run_polled_stage(
        registry,
        config,
        scheduler,
        poll_config,
        QueueType::Render,
        &render_input,
    )
    .await?;
    info!(url = %video_url, "render stage complete");

    Ok(PipelineOutput {
        video_url,
        captions: words,
        duration_secs: narration_duration,
    })
}

async fn run_polled_stage(
    registry: &ProviderRegistry,
    config: &OrchestratorConfig,
    scheduler: &dyn Scheduler,
    poll_config: PollConfig,
    queue: QueueType,
    input: &JobInput,
) -> Result<(String, Option<f64>), WorkflowError> {
    let provider = registry
        .get(queue)
        .ok_or(WorkflowError::UnknownQueue(queue))?;
    let Provider::Polled(adapter) = provider else {
        return Err(WorkflowError::UnknownQueue(queue));
    };

    let external = start_with_retries(adapter.as_ref(), input, &config.timing, scheduler).await?;
    let probe = poll_until_terminal(
        adapter.clone(),
        external,
        poll_config,
        config.timing.start_to_close,
        scheduler,
    )
    .await?;

    Ok((probe.url.unwrap_or_default(), probe.duration_secs))
}
