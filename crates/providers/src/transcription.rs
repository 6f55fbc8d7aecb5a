//! Client for the speech-to-text transcription service.
//!
//! Unlike the generation providers, transcription is synchronous: one
//! request returns the full transcript with word timings. There is no
//! external id and no polling, so this client implements
//! [`DirectProvider`] rather than [`crate::ProviderAdapter`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use reelflow_core::config::ProviderEndpoint;
use reelflow_core::params::{JobInput, JobOutput, TranscriptionParams, Word};

use crate::adapter::DirectProvider;
use crate::error::ProviderError;
use crate::http::parse_json;

pub struct TranscriptionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct TranscribeRequest<'a> {
    url: &'a str,
    language: &'a str,
    model: &'a str,
    punctuate: bool,
    keywords: &'a [String],
}

#[derive(Debug, Deserialize)]
pub struct Transcript {
    pub transcript: String,
    pub words: Vec<Word>,
}

impl TranscriptionClient {
    pub fn new(client: reqwest::Client, endpoint: &ProviderEndpoint) -> Self {
        Self {
            client,
            base_url: endpoint.base_url.clone(),
            api_key: endpoint.api_key.clone(),
        }
    }

    /// Transcribe a finished video in one blocking provider call.
    pub async fn transcribe(
        &self,
        params: &TranscriptionParams,
    ) -> Result<Transcript, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/transcribe", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&TranscribeRequest {
                url: &params.video_url,
                language: &params.language,
                model: &params.model,
                punctuate: params.punctuate,
                keywords: &params.keywords,
            })
            .send()
            .await?;

        parse_json(response).await
    }
}

#[async_trait]
impl DirectProvider for TranscriptionClient {
    async fn run(&self, input: &JobInput) -> Result<JobOutput, ProviderError> {
        match input {
            JobInput::Transcription(params) => {
                let result = self.transcribe(params).await?;
                Ok(JobOutput::Transcript {
                    transcript: result.transcript,
                    words: result.words,
                })
            }
            other => Err(ProviderError::InvalidInput(format!(
                "expected transcription params, got {}",
                other.queue_type()
            ))),
        }
    }
}
