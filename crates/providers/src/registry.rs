//! Queue-to-provider wiring.
//!
//! Each queue resolves to either a polled adapter (start, then probe
//! until terminal) or a direct provider (one synchronous call). The
//! registry is built once at startup from [`OrchestratorConfig`] and
//! shared across workers.

use std::collections::HashMap;
use std::sync::Arc;

use reelflow_core::config::OrchestratorConfig;
use reelflow_core::job::QueueType;

use crate::adapter::{DirectProvider, ProviderAdapter};
use crate::avatar::AvatarClient;
use crate::background::BackgroundRemovalClient;
use crate::image::ImageClient;
use crate::render::RenderClient;
use crate::transcription::TranscriptionClient;
use crate::video::VideoClient;

/// How a queue's work reaches its external service.
#[derive(Clone)]
pub enum Provider {
    /// Asynchronous: start returns an external ref, status is probed.
    Polled(Arc<dyn ProviderAdapter>),
    /// Synchronous: a single call produces the output.
    Direct(Arc<dyn DirectProvider>),
}

pub struct ProviderRegistry {
    providers: HashMap<QueueType, Provider>,
}

impl ProviderRegistry {
    pub fn new(providers: HashMap<QueueType, Provider>) -> Self {
        Self { providers }
    }

    /// Build the full registry from config, sharing one HTTP client
    /// across all service clients.
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        let client = reqwest::Client::new();
        let endpoints = &config.endpoints;

        let mut providers: HashMap<QueueType, Provider> = HashMap::new();
        providers.insert(
            QueueType::AvatarSynthesis,
            Provider::Polled(Arc::new(AvatarClient::new(
                client.clone(),
                &endpoints.avatar,
            ))),
        );
        providers.insert(
            QueueType::ImageSynthesis,
            Provider::Polled(Arc::new(ImageClient::new(client.clone(), &endpoints.image))),
        );
        providers.insert(
            QueueType::VideoSynthesis,
            Provider::Polled(Arc::new(VideoClient::new(client.clone(), &endpoints.video))),
        );
        providers.insert(
            QueueType::Render,
            Provider::Polled(Arc::new(RenderClient::new(
                client.clone(),
                &endpoints.render,
            ))),
        );
        providers.insert(
            QueueType::Transcription,
            Provider::Direct(Arc::new(TranscriptionClient::new(
                client.clone(),
                &endpoints.transcription,
            ))),
        );
        providers.insert(
            QueueType::BackgroundRemoval,
            Provider::Polled(Arc::new(BackgroundRemovalClient::new(
                client,
                &endpoints.background_removal,
            ))),
        );

        Self { providers }
    }

    pub fn get(&self, queue: QueueType) -> Option<&Provider> {
        self.providers.get(&queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_covers_every_queue() {
        let registry = ProviderRegistry::from_config(&OrchestratorConfig::default());
        for queue in QueueType::ALL {
            assert!(registry.get(queue).is_some(), "missing provider for {queue}");
        }
    }

    #[test]
    fn transcription_is_direct_and_render_is_polled() {
        let registry = ProviderRegistry::from_config(&OrchestratorConfig::default());
        assert!(matches!(
            registry.get(QueueType::Transcription),
            Some(Provider::Direct(_))
        ));
        assert!(matches!(
            registry.get(QueueType::Render),
            Some(Provider::Polled(_))
        ));
    }
}
