//! HTTP surface of the orchestrator.
//!
//! Exposed as a library so integration tests can build the exact
//! production router with a test store.

pub mod config;
pub mod error;
pub mod router;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{AppError, AppResult};
pub use router::build_app_router;
pub use state::AppState;
