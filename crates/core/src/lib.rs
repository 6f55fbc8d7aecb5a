//! Shared domain types for the reelflow orchestration platform.
//!
//! Job records, per-provider parameter/result types, the error taxonomy,
//! and orchestrator configuration. No internal dependencies.

pub mod config;
pub mod error;
pub mod job;
pub mod params;
pub mod types;
