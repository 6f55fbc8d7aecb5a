//! Narration pipeline: stage chaining and failure short-circuiting.

mod common;

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{FakeAdapter, FakeDirect, NoopScheduler};

use reelflow_core::config::OrchestratorConfig;
use reelflow_core::job::QueueType;
use reelflow_core::params::{JobInput, JobOutput, Word};
use reelflow_engine::{run_pipeline, PipelineParams, WorkflowError};
use reelflow_providers::{ExternalRef, Provider, ProviderRegistry, StatusProbe};

fn test_config() -> OrchestratorConfig {
    let mut config = OrchestratorConfig::default();
    config.poll.max_attempts = 3;
    config.poll.interval = Duration::from_millis(1);
    config.timing.start_retry_delay = Duration::from_millis(1);
    config
}

fn params() -> PipelineParams {
    PipelineParams {
        script: "welcome to the channel".into(),
        avatar_id: "ava-1".into(),
        voice_id: "voc-1".into(),
        hook: Some("You won't believe this".into()),
        background_url: Some("https://cdn.example/bg.mp4".into()),
        color: Some("#ffffff".into()),
        position: Some("bottom".into()),
        size: Some(42.0),
        language: None,
        composition: None,
    }
}

fn registry(
    avatar: Arc<FakeAdapter>,
    transcription: Arc<FakeDirect>,
    render: Arc<FakeAdapter>,
) -> ProviderRegistry {
    ProviderRegistry::new(HashMap::from([
        (QueueType::AvatarSynthesis, Provider::Polled(avatar as _)),
        (QueueType::Transcription, Provider::Direct(transcription as _)),
        (QueueType::Render, Provider::Polled(render as _)),
    ]))
}

#[tokio::test]
async fn stages_chain_their_artifacts() {
    let avatar = Arc::new(FakeAdapter::new());
    avatar.push_start(Ok(ExternalRef::new("narration-1")));
    avatar.push_probe(StatusProbe::pending());
    avatar.push_probe(StatusProbe::ready(
        Some("https://cdn.example/narration.mp4".into()),
        Some(14.5),
    ));

    let words = vec![
        Word {
            word: "welcome".into(),
            start: 0.0,
            end: 0.5,
        },
        Word {
            word: "to".into(),
            start: 0.5,
            end: 0.7,
        },
    ];
    let transcription = Arc::new(FakeDirect::new());
    transcription.push(Ok(JobOutput::Transcript {
        transcript: "welcome to".into(),
        words: words.clone(),
    }));

    let render = Arc::new(FakeAdapter::new());
    render.push_start(Ok(ExternalRef::with_bucket("render-1", "bucket-a")));
    render.push_probe(StatusProbe::ready(
        Some("https://cdn.example/final.mp4".into()),
        None,
    ));

    let registry = registry(avatar, transcription.clone(), render.clone());
    let output = run_pipeline(&registry, &test_config(), &NoopScheduler, params())
        .await
        .unwrap();

    assert_eq!(output.video_url, "https://cdn.example/final.mp4");
    assert_eq!(output.captions, words);
    assert_eq!(output.duration_secs, Some(14.5));

    // The render stage received the narration artifacts, not the
    // original request fields.
    let input = render.last_input.lock().unwrap().clone().unwrap();
    let JobInput::Render(render_params) = input else {
        panic!("expected render input");
    };
    assert_eq!(
        render_params.input_props.overlay_url.as_deref(),
        Some("https://cdn.example/narration.mp4")
    );
    assert_eq!(render_params.input_props.captions, words);
    assert_eq!(render_params.input_props.duration_secs, Some(14.5));
    assert_eq!(
        render_params.input_props.hook.as_deref(),
        Some("You won't believe this")
    );
}

#[tokio::test]
async fn narration_failure_skips_later_stages() {
    let avatar = Arc::new(FakeAdapter::new());
    avatar.push_start(Ok(ExternalRef::new("narration-1")));
    avatar.push_probe(StatusProbe::failed("voice model unavailable"));

    let transcription = Arc::new(FakeDirect::new());
    let render = Arc::new(FakeAdapter::new());

    let registry = registry(avatar, transcription.clone(), render.clone());
    let result = run_pipeline(&registry, &test_config(), &NoopScheduler, params()).await;

    assert_matches!(result, Err(WorkflowError::Poll(_)));
    assert_eq!(transcription.calls.load(Ordering::SeqCst), 0);
    assert_eq!(render.start_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn transcription_failure_skips_render() {
    let avatar = Arc::new(FakeAdapter::new());
    avatar.push_start(Ok(ExternalRef::new("narration-1")));
    avatar.push_probe(StatusProbe::ready(
        Some("https://cdn.example/narration.mp4".into()),
        Some(9.0),
    ));

    let transcription = Arc::new(FakeDirect::new());
    transcription.push(Err(reelflow_providers::ProviderError::InvalidInput(
        "unsupported codec".into(),
    )));

    let render = Arc::new(FakeAdapter::new());

    let registry = registry(avatar, transcription, render.clone());
    let result = run_pipeline(&registry, &test_config(), &NoopScheduler, params()).await;

    assert_matches!(result, Err(WorkflowError::Direct(_)));
    assert_eq!(render.start_calls.load(Ordering::SeqCst), 0);
}
