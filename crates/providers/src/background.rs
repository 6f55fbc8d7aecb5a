//! Client for the image background removal service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use reelflow_core::config::ProviderEndpoint;
use reelflow_core::params::{BackgroundRemovalParams, JobInput};

use crate::adapter::{ExternalRef, ProviderAdapter, StatusProbe};
use crate::error::ProviderError;
use crate::http::parse_json;

pub struct BackgroundRemovalClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct CreateRemoval<'a> {
    image_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct RemovalCreated {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RemovalStatus {
    status: String,
    output_url: Option<String>,
    error: Option<String>,
}

impl BackgroundRemovalClient {
    pub fn new(client: reqwest::Client, endpoint: &ProviderEndpoint) -> Self {
        Self {
            client,
            base_url: endpoint.base_url.clone(),
            api_key: endpoint.api_key.clone(),
        }
    }

    async fn create(
        &self,
        params: &BackgroundRemovalParams,
    ) -> Result<ExternalRef, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/removals", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&CreateRemoval {
                image_url: &params.image_url,
            })
            .send()
            .await?;

        let body: RemovalCreated = parse_json(response).await?;
        Ok(ExternalRef::new(body.id))
    }

    async fn status(&self, id: &str) -> Result<StatusProbe, ProviderError> {
        let response = self
            .client
            .get(format!("{}/v1/removals/{id}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let body: RemovalStatus = parse_json(response).await?;
        Ok(match body.status.as_str() {
            "ready" => StatusProbe::ready(body.output_url, None),
            "failed" => StatusProbe::failed(
                body.error
                    .unwrap_or_else(|| "background removal failed".into()),
            ),
            _ => StatusProbe::pending(),
        })
    }
}

#[async_trait]
impl ProviderAdapter for BackgroundRemovalClient {
    async fn start(&self, input: &JobInput) -> Result<ExternalRef, ProviderError> {
        match input {
            JobInput::BackgroundRemoval(params) => self.create(params).await,
            other => Err(ProviderError::InvalidInput(format!(
                "expected background-removal params, got {}",
                other.queue_type()
            ))),
        }
    }

    async fn check_status(&self, external: &ExternalRef) -> Result<StatusProbe, ProviderError> {
        self.status(&external.id).await
    }
}
