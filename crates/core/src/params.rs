//! Strongly-typed provider parameters and results.
//!
//! Inputs and outputs stay structured inside the system; they are
//! serialized to JSON only at the persistence boundary.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::job::QueueType;

// ---------------------------------------------------------------------------
// Per-provider parameters
// ---------------------------------------------------------------------------

/// Avatar narration synthesis: a presenter reads a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarParams {
    pub script: String,
    pub avatar_id: String,
    pub voice_id: String,
}

/// Text-to-image synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageParams {
    pub prompt: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub style: Option<String>,
}

/// Text/image-to-video synthesis. At least one of `prompt` or
/// `source_image_url` drives the generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoParams {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub source_image_url: Option<String>,
    #[serde(default)]
    pub duration_secs: Option<f64>,
    #[serde(default)]
    pub ratio: Option<String>,
}

/// Input props handed to the render composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderInputProps {
    #[serde(default)]
    pub hook: Option<String>,
    #[serde(default)]
    pub background_url: Option<String>,
    #[serde(default)]
    pub overlay_url: Option<String>,
    #[serde(default)]
    pub duration_secs: Option<f64>,
    #[serde(default)]
    pub captions: Vec<Word>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub size: Option<f64>,
}

/// Programmatic video rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderParams {
    pub composition: String,
    #[serde(default)]
    pub input_props: RenderInputProps,
    #[serde(default = "default_render_width")]
    pub width: u32,
    #[serde(default = "default_render_height")]
    pub height: u32,
    #[serde(default = "default_render_fps")]
    pub fps: u32,
}

fn default_render_width() -> u32 {
    1080
}

fn default_render_height() -> u32 {
    1920
}

fn default_render_fps() -> u32 {
    30
}

/// Speech-to-text transcription of a finished video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionParams {
    pub video_url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_punctuate")]
    pub punctuate: bool,
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_language() -> String {
    "en".into()
}

fn default_model() -> String {
    "general".into()
}

fn default_punctuate() -> bool {
    true
}

/// Single-image background removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundRemovalParams {
    pub image_url: String,
}

// ---------------------------------------------------------------------------
// JobInput
// ---------------------------------------------------------------------------

/// Typed input of a job, one variant per queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "kebab-case")]
pub enum JobInput {
    AvatarSynthesis(AvatarParams),
    ImageSynthesis(ImageParams),
    VideoSynthesis(VideoParams),
    Render(RenderParams),
    Transcription(TranscriptionParams),
    BackgroundRemoval(BackgroundRemovalParams),
}

impl JobInput {
    /// The queue this input belongs to.
    pub fn queue_type(&self) -> QueueType {
        match self {
            JobInput::AvatarSynthesis(_) => QueueType::AvatarSynthesis,
            JobInput::ImageSynthesis(_) => QueueType::ImageSynthesis,
            JobInput::VideoSynthesis(_) => QueueType::VideoSynthesis,
            JobInput::Render(_) => QueueType::Render,
            JobInput::Transcription(_) => QueueType::Transcription,
            JobInput::BackgroundRemoval(_) => QueueType::BackgroundRemoval,
        }
    }

    /// Parse raw enqueue params for a queue into typed input.
    ///
    /// This is the system boundary where untyped payloads are validated;
    /// beyond here params are always structured.
    pub fn from_params(
        queue: QueueType,
        params: serde_json::Value,
    ) -> Result<Self, CoreError> {
        let result = match queue {
            QueueType::AvatarSynthesis => {
                serde_json::from_value(params).map(JobInput::AvatarSynthesis)
            }
            QueueType::ImageSynthesis => {
                serde_json::from_value(params).map(JobInput::ImageSynthesis)
            }
            QueueType::VideoSynthesis => {
                serde_json::from_value(params).map(JobInput::VideoSynthesis)
            }
            QueueType::Render => serde_json::from_value(params).map(JobInput::Render),
            QueueType::Transcription => {
                serde_json::from_value(params).map(JobInput::Transcription)
            }
            QueueType::BackgroundRemoval => {
                serde_json::from_value(params).map(JobInput::BackgroundRemoval)
            }
        };
        result.map_err(|e| CoreError::Validation(format!("Invalid {queue} params: {e}")))
    }
}

// ---------------------------------------------------------------------------
// JobOutput
// ---------------------------------------------------------------------------

/// One transcribed word with its timing window in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

/// Typed terminal result of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum JobOutput {
    /// A generated media artifact (narration video, image, synthesized video,
    /// background-removed image).
    Media {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_secs: Option<f64>,
    },
    /// A finished render.
    Render { video_url: String },
    /// A transcription result.
    Transcript { transcript: String, words: Vec<Word> },
    /// Terminal failure detail for jobs ending in `error`/`failed`.
    Failure { error: String },
}

impl JobOutput {
    /// URL of the terminal artifact, if the output carries one.
    pub fn url(&self) -> Option<&str> {
        match self {
            JobOutput::Media { url, .. } => Some(url),
            JobOutput::Render { video_url } => Some(video_url),
            JobOutput::Transcript { .. } | JobOutput::Failure { .. } => None,
        }
    }

    /// Duration of the terminal artifact, if known.
    pub fn duration_secs(&self) -> Option<f64> {
        match self {
            JobOutput::Media { duration_secs, .. } => *duration_secs,
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
