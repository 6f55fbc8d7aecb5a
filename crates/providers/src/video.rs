//! Client for the text/image-to-video synthesis service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use reelflow_core::config::ProviderEndpoint;
use reelflow_core::params::{JobInput, VideoParams};

use crate::adapter::{ExternalRef, ProviderAdapter, StatusProbe};
use crate::error::ProviderError;
use crate::http::parse_json;

pub struct VideoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct CreateGeneration<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ratio: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GenerationCreated {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GenerationStatus {
    status: String,
    video_url: Option<String>,
    duration: Option<f64>,
    failure_reason: Option<String>,
}

impl VideoClient {
    pub fn new(client: reqwest::Client, endpoint: &ProviderEndpoint) -> Self {
        Self {
            client,
            base_url: endpoint.base_url.clone(),
            api_key: endpoint.api_key.clone(),
        }
    }

    async fn create(&self, params: &VideoParams) -> Result<ExternalRef, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&CreateGeneration {
                prompt: params.prompt.as_deref(),
                image_url: params.source_image_url.as_deref(),
                duration: params.duration_secs,
                ratio: params.ratio.as_deref(),
            })
            .send()
            .await?;

        let body: GenerationCreated = parse_json(response).await?;
        Ok(ExternalRef::new(body.id))
    }

    async fn status(&self, id: &str) -> Result<StatusProbe, ProviderError> {
        let response = self
            .client
            .get(format!("{}/v1/generations/{id}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let body: GenerationStatus = parse_json(response).await?;
        Ok(match body.status.as_str() {
            // Providers differ on the terminal success literal.
            "ready" | "succeeded" => StatusProbe::ready(body.video_url, body.duration),
            "failed" => StatusProbe::failed(
                body.failure_reason
                    .unwrap_or_else(|| "video synthesis failed".into()),
            ),
            _ => StatusProbe::pending(),
        })
    }
}

#[async_trait]
impl ProviderAdapter for VideoClient {
    async fn start(&self, input: &JobInput) -> Result<ExternalRef, ProviderError> {
        match input {
            JobInput::VideoSynthesis(params) => self.create(params).await,
            other => Err(ProviderError::InvalidInput(format!(
                "expected video-synthesis params, got {}",
                other.queue_type()
            ))),
        }
    }

    async fn check_status(&self, external: &ExternalRef) -> Result<StatusProbe, ProviderError> {
        self.status(&external.id).await
    }
}
