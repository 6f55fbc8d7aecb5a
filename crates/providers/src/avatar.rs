//! Client for the avatar narration synthesis service.
//!
//! `start` submits a script + avatar + voice triple and returns the
//! provider's video id; `check_status` maps the provider's status record
//! into a [`StatusProbe`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use reelflow_core::config::ProviderEndpoint;
use reelflow_core::params::{AvatarParams, JobInput};

use crate::adapter::{ExternalRef, ProviderAdapter, StatusProbe};
use crate::error::ProviderError;
use crate::http::parse_json;

pub struct AvatarClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    script: &'a str,
    avatar_id: &'a str,
    voice_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct VideoStatus {
    status: String,
    video_url: Option<String>,
    duration: Option<f64>,
    error: Option<String>,
}

impl AvatarClient {
    pub fn new(client: reqwest::Client, endpoint: &ProviderEndpoint) -> Self {
        Self {
            client,
            base_url: endpoint.base_url.clone(),
            api_key: endpoint.api_key.clone(),
        }
    }

    async fn generate(&self, params: &AvatarParams) -> Result<ExternalRef, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/videos", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&GenerateRequest {
                script: &params.script,
                avatar_id: &params.avatar_id,
                voice_id: &params.voice_id,
            })
            .send()
            .await?;

        let body: GenerateResponse = parse_json(response).await?;
        Ok(ExternalRef::new(body.video_id))
    }

    async fn status(&self, video_id: &str) -> Result<StatusProbe, ProviderError> {
        let response = self
            .client
            .get(format!("{}/v1/videos/{video_id}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let body: VideoStatus = parse_json(response).await?;
        Ok(match body.status.as_str() {
            "ready" => StatusProbe::ready(body.video_url, body.duration),
            "failed" => StatusProbe::failed(
                body.error
                    .unwrap_or_else(|| "avatar synthesis failed".into()),
            ),
            _ => StatusProbe::pending(),
        })
    }
}

#[async_trait]
impl ProviderAdapter for AvatarClient {
    async fn start(&self, input: &JobInput) -> Result<ExternalRef, ProviderError> {
        match input {
            JobInput::AvatarSynthesis(params) => self.generate(params).await,
            other => Err(ProviderError::InvalidInput(format!(
                "expected avatar-synthesis params, got {}",
                other.queue_type()
            ))),
        }
    }

    async fn check_status(&self, external: &ExternalRef) -> Result<StatusProbe, ProviderError> {
        self.status(&external.id).await
    }
}
