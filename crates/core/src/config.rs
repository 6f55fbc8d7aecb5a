//! Orchestrator configuration.
//!
//! Constructed once at process start ([`OrchestratorConfig::from_env`] in
//! the binaries) and passed by reference into every component. Business
//! logic never reads ambient process state.

use std::time::Duration;

use crate::job::QueueType;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Default seconds between status probes.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Default bound on status probes per workflow.
const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 90;

/// Default ceiling for one provider activity call (start or probe).
const DEFAULT_START_TO_CLOSE_SECS: u64 = 120;

/// Default transient-retry count for provider `start` calls.
const DEFAULT_START_RETRIES: u32 = 3;

/// Default delay between start retries.
const DEFAULT_START_RETRY_DELAY_SECS: u64 = 2;

/// Default retry count for synchronous (non-polled) provider calls.
const DEFAULT_DIRECT_RETRIES: u32 = 3;

/// Default pool sleep when a queue has no pending work.
const DEFAULT_IDLE_BACKOFF_MS: u64 = 1000;

// ---------------------------------------------------------------------------
// Provider endpoints
// ---------------------------------------------------------------------------

/// Connection settings for one external provider.
#[derive(Debug, Clone)]
pub struct ProviderEndpoint {
    pub base_url: String,
    pub api_key: String,
}

impl ProviderEndpoint {
    fn from_env(url_var: &str, key_var: &str, default_url: &str) -> Self {
        Self {
            base_url: std::env::var(url_var).unwrap_or_else(|_| default_url.into()),
            api_key: std::env::var(key_var).unwrap_or_default(),
        }
    }
}

/// One endpoint per provider queue.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub avatar: ProviderEndpoint,
    pub image: ProviderEndpoint,
    pub video: ProviderEndpoint,
    pub render: ProviderEndpoint,
    pub transcription: ProviderEndpoint,
    pub background_removal: ProviderEndpoint,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            avatar: ProviderEndpoint {
                base_url: "http://localhost:8601".into(),
                api_key: String::new(),
            },
            image: ProviderEndpoint {
                base_url: "http://localhost:8602".into(),
                api_key: String::new(),
            },
            video: ProviderEndpoint {
                base_url: "http://localhost:8603".into(),
                api_key: String::new(),
            },
            render: ProviderEndpoint {
                base_url: "http://localhost:8604".into(),
                api_key: String::new(),
            },
            transcription: ProviderEndpoint {
                base_url: "http://localhost:8605".into(),
                api_key: String::new(),
            },
            background_removal: ProviderEndpoint {
                base_url: "http://localhost:8606".into(),
                api_key: String::new(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Poll tuning / pool caps
// ---------------------------------------------------------------------------

/// Bounds for the polling engine: at most `max_attempts` probes,
/// `interval` apart.
#[derive(Debug, Clone, Copy)]
pub struct PollTuning {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollTuning {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
        }
    }
}

/// Maximum concurrent in-flight jobs per queue.
///
/// Caps respect downstream provider rate limits; rendering is far more
/// expensive than synthesis and defaults to a single slot.
#[derive(Debug, Clone, Copy)]
pub struct PoolCaps {
    pub avatar_synthesis: u32,
    pub image_synthesis: u32,
    pub video_synthesis: u32,
    pub render: u32,
    pub transcription: u32,
    pub background_removal: u32,
}

impl PoolCaps {
    pub fn for_queue(&self, queue: QueueType) -> u32 {
        match queue {
            QueueType::AvatarSynthesis => self.avatar_synthesis,
            QueueType::ImageSynthesis => self.image_synthesis,
            QueueType::VideoSynthesis => self.video_synthesis,
            QueueType::Render => self.render,
            QueueType::Transcription => self.transcription,
            QueueType::BackgroundRemoval => self.background_removal,
        }
    }
}

impl Default for PoolCaps {
    fn default() -> Self {
        Self {
            avatar_synthesis: 2,
            image_synthesis: 4,
            video_synthesis: 4,
            render: 1,
            transcription: 4,
            background_removal: 4,
        }
    }
}

// ---------------------------------------------------------------------------
// OrchestratorConfig
// ---------------------------------------------------------------------------

/// Full orchestrator configuration.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    pub endpoints: ProviderEndpoints,
    pub poll: PollTuning,
    pub pool_caps: PoolCaps,
    pub timing: TimingConfig,
}

/// Activity-level timing knobs.
#[derive(Debug, Clone, Copy)]
pub struct TimingConfig {
    /// Engine-level ceiling for a single provider activity call. Honored
    /// alongside the polling engine's own `max_attempts * interval`
    /// ceiling; whichever elapses first terminates the stage.
    pub start_to_close: Duration,
    pub start_retries: u32,
    pub start_retry_delay: Duration,
    pub direct_retries: u32,
    pub idle_backoff: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            start_to_close: Duration::from_secs(DEFAULT_START_TO_CLOSE_SECS),
            start_retries: DEFAULT_START_RETRIES,
            start_retry_delay: Duration::from_secs(DEFAULT_START_RETRY_DELAY_SECS),
            direct_retries: DEFAULT_DIRECT_RETRIES,
            idle_backoff: Duration::from_millis(DEFAULT_IDLE_BACKOFF_MS),
        }
    }
}

impl OrchestratorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                 |
    /// |----------------------------------|-------------------------|
    /// | `AVATAR_API_URL` / `_KEY`        | `http://localhost:8601` |
    /// | `IMAGE_API_URL` / `_KEY`         | `http://localhost:8602` |
    /// | `VIDEO_API_URL` / `_KEY`         | `http://localhost:8603` |
    /// | `RENDER_API_URL` / `_KEY`        | `http://localhost:8604` |
    /// | `TRANSCRIPTION_API_URL` / `_KEY` | `http://localhost:8605` |
    /// | `BG_REMOVAL_API_URL` / `_KEY`    | `http://localhost:8606` |
    /// | `POLL_INTERVAL_SECS`             | `10`                    |
    /// | `POLL_MAX_ATTEMPTS`              | `90`                    |
    /// | `START_TO_CLOSE_SECS`            | `120`                   |
    /// | `RENDER_POOL_CAP`                | `1`                     |
    pub fn from_env() -> Self {
        let endpoints = ProviderEndpoints {
            avatar: ProviderEndpoint::from_env(
                "AVATAR_API_URL",
                "AVATAR_API_KEY",
                "http://localhost:8601",
            ),
            image: ProviderEndpoint::from_env(
                "IMAGE_API_URL",
                "IMAGE_API_KEY",
                "http://localhost:8602",
            ),
            video: ProviderEndpoint::from_env(
                "VIDEO_API_URL",
                "VIDEO_API_KEY",
                "http://localhost:8603",
            ),
            render: ProviderEndpoint::from_env(
                "RENDER_API_URL",
                "RENDER_API_KEY",
                "http://localhost:8604",
            ),
            transcription: ProviderEndpoint::from_env(
                "TRANSCRIPTION_API_URL",
                "TRANSCRIPTION_API_KEY",
                "http://localhost:8605",
            ),
            background_removal: ProviderEndpoint::from_env(
                "BG_REMOVAL_API_URL",
                "BG_REMOVAL_API_KEY",
                "http://localhost:8606",
            ),
        };

        let poll = PollTuning {
            interval: Duration::from_secs(env_num(
                "POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL_SECS,
            )),
            max_attempts: env_num("POLL_MAX_ATTEMPTS", DEFAULT_POLL_MAX_ATTEMPTS),
        };

        let defaults = PoolCaps::default();
        let pool_caps = PoolCaps {
            avatar_synthesis: env_num("AVATAR_POOL_CAP", defaults.avatar_synthesis),
            image_synthesis: env_num("IMAGE_POOL_CAP", defaults.image_synthesis),
            video_synthesis: env_num("VIDEO_POOL_CAP", defaults.video_synthesis),
            render: env_num("RENDER_POOL_CAP", defaults.render),
            transcription: env_num("TRANSCRIPTION_POOL_CAP", defaults.transcription),
            background_removal: env_num("BG_REMOVAL_POOL_CAP", defaults.background_removal),
        };

        let timing = TimingConfig {
            start_to_close: Duration::from_secs(env_num(
                "START_TO_CLOSE_SECS",
                DEFAULT_START_TO_CLOSE_SECS,
            )),
            ..TimingConfig::default()
        };

        Self {
            endpoints,
            poll,
            pool_caps,
            timing,
        }
    }
}

/// Read a numeric env var with a default. Fails fast on unparsable or
/// out-of-range values, which is the desired startup behaviour.
fn env_num<T>(var: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{var} must be a valid integer: {e}")),
        Err(_) => default,
    }
}
