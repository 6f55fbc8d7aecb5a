//! Client for the programmatic video render service.
//!
//! The render provider is the one adapter whose external reference is a
//! pair: the render id plus the output bucket assigned at start time.
//! Progress reports a `done` flag and an error list; any fatal entry in
//! that list fails the job.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use reelflow_core::config::ProviderEndpoint;
use reelflow_core::params::{JobInput, RenderInputProps, RenderParams};

use crate::adapter::{ExternalRef, ProviderAdapter, StatusProbe};
use crate::error::ProviderError;
use crate::http::parse_json;

pub struct RenderClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct StartRender<'a> {
    composition: &'a str,
    input_props: &'a RenderInputProps,
    width: u32,
    height: u32,
    fps: u32,
}

#[derive(Debug, Deserialize)]
struct RenderStarted {
    render_id: String,
    bucket_name: String,
}

#[derive(Debug, Deserialize)]
struct RenderProgress {
    done: bool,
    output_file: Option<String>,
    #[serde(default)]
    errors: Vec<RenderIssue>,
}

#[derive(Debug, Deserialize)]
struct RenderIssue {
    message: String,
    #[serde(default)]
    fatal: bool,
}

impl RenderClient {
    pub fn new(client: reqwest::Client, endpoint: &ProviderEndpoint) -> Self {
        Self {
            client,
            base_url: endpoint.base_url.clone(),
            api_key: endpoint.api_key.clone(),
        }
    }

    async fn start_render(&self, params: &RenderParams) -> Result<ExternalRef, ProviderError> {
        let response = self
            .client
            .post(format!("{}/renders", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&StartRender {
                composition: &params.composition,
                input_props: &params.input_props,
                width: params.width,
                height: params.height,
                fps: params.fps,
            })
            .send()
            .await?;

        let body: RenderStarted = parse_json(response).await?;
        Ok(ExternalRef::with_bucket(body.render_id, body.bucket_name))
    }

    async fn progress(&self, external: &ExternalRef) -> Result<StatusProbe, ProviderError> {
        let bucket = external.bucket.as_deref().ok_or_else(|| {
            ProviderError::InvalidInput("render progress requires a bucket".into())
        })?;

        let response = self
            .client
            .get(format!(
                "{}/renders/{bucket}/{}",
                self.base_url, external.id
            ))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let body: RenderProgress = parse_json(response).await?;

        let fatal: Vec<&str> = body
            .errors
            .iter()
            .filter(|issue| issue.fatal)
            .map(|issue| issue.message.as_str())
            .collect();
        if !fatal.is_empty() {
            return Ok(StatusProbe::failed(fatal.join("; ")));
        }

        Ok(if body.done {
            StatusProbe::ready(body.output_file, None)
        } else {
            StatusProbe::pending()
        })
    }
}

#[async_trait]
impl ProviderAdapter for RenderClient {
    async fn start(&self, input: &JobInput) -> Result<ExternalRef, ProviderError> {
        match input {
            JobInput::Render(params) => self.start_render(params).await,
            other => Err(ProviderError::InvalidInput(format!(
                "expected render params, got {}",
                other.queue_type()
            ))),
        }
    }

    async fn check_status(&self, external: &ExternalRef) -> Result<StatusProbe, ProviderError> {
        self.progress(external).await
    }
}
