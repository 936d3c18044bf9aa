//! Core types for the toolhub core.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Strongly-typed identifiers (CorrelationId, RunId)
//! - **Errors**: Application error types with thiserror derives and stable codes
//! - **Config**: Configuration structures for dispatch, resolution and orchestration

mod config;
mod errors;
mod ids;

pub use config::{Config, DispatchConfig, ObservabilityConfig, PipelineConfig, ResolverConfig};
pub use errors::{Error, ErrorCode, Result};
pub use ids::{CorrelationId, RunId};
