//! Provider adapters for the external generation services.
//!
//! Each adapter wraps one provider's HTTP API behind the uniform
//! [`ProviderAdapter`] contract (`start` + `check_status`) so the
//! orchestration engine can drive any queue the same way. Transcription
//! is the one synchronous provider and implements [`DirectProvider`]
//! instead. The [`ProviderRegistry`] resolves queue types to adapters and
//! is built once at startup.

pub mod adapter;
pub mod avatar;
pub mod background;
pub mod error;
mod http;
pub mod image;
pub mod registry;
pub mod render;
pub mod transcription;
pub mod video;

pub use adapter::{DirectProvider, ExternalRef, ProbeState, ProviderAdapter, StatusProbe};
pub use error::ProviderError;
pub use registry::{Provider, ProviderRegistry};
