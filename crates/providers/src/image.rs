//! Client for the text-to-image synthesis service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use reelflow_core::config::ProviderEndpoint;
use reelflow_core::params::{ImageParams, JobInput};

use crate::adapter::{ExternalRef, ProviderAdapter, StatusProbe};
use crate::error::ProviderError;
use crate::http::parse_json;

pub struct ImageClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct CreateTask<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TaskCreated {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct TaskStatus {
    status: String,
    image_url: Option<String>,
    error: Option<String>,
}

impl ImageClient {
    pub fn new(client: reqwest::Client, endpoint: &ProviderEndpoint) -> Self {
        Self {
            client,
            base_url: endpoint.base_url.clone(),
            api_key: endpoint.api_key.clone(),
        }
    }

    async fn create(&self, params: &ImageParams) -> Result<ExternalRef, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/images", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&CreateTask {
                prompt: &params.prompt,
                width: params.width,
                height: params.height,
                style: params.style.as_deref(),
            })
            .send()
            .await?;

        let body: TaskCreated = parse_json(response).await?;
        Ok(ExternalRef::new(body.task_id))
    }

    async fn status(&self, task_id: &str) -> Result<StatusProbe, ProviderError> {
        let response = self
            .client
            .get(format!("{}/v1/images/{task_id}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let body: TaskStatus = parse_json(response).await?;
        Ok(match body.status.as_str() {
            "ready" => StatusProbe::ready(body.image_url, None),
            "failed" => StatusProbe::failed(
                body.error
                    .unwrap_or_else(|| "image synthesis failed".into()),
            ),
            _ => StatusProbe::pending(),
        })
    }
}

#[async_trait]
impl ProviderAdapter for ImageClient {
    async fn start(&self, input: &JobInput) -> Result<ExternalRef, ProviderError> {
        match input {
            JobInput::ImageSynthesis(params) => self.create(params).await,
            other => Err(ProviderError::InvalidInput(format!(
                "expected image-synthesis params, got {}",
                other.queue_type()
            ))),
        }
    }

    async fn check_status(&self, external: &ExternalRef) -> Result<StatusProbe, ProviderError> {
        self.status(&external.id).await
    }
}
