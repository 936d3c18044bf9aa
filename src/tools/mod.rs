//! Tool infrastructure: catalog, name resolution, search, health tracking.
//!
//! The registry owns tool metadata only. Implementations live behind the
//! handler interface in [`crate::dispatch`]; the discovery tools are the
//! one set of handlers this crate ships itself.

pub mod builtin;
pub mod catalog;
pub mod descriptor;
pub mod discovery;
pub mod health;
pub mod resolver;
pub mod search;

pub use catalog::{RegistryBuilder, ToolRegistry};
pub use descriptor::{Frequency, ToolCategory, ToolDescriptor, ToolExample, ToolId};
pub use health::{
    CircuitBreaker, CircuitState, HealthConfig, HealthStatus, SystemHealthReport,
    ToolHealthTracker,
};
pub use resolver::{normalize_name, MatchKind, NameResolver, Resolution};
pub use search::{SearchHit, SearchQuery};
