//! # Toolhub Core - Tool Routing, Validation and Orchestration
//!
//! Shared protocol layer for a family of tool servers (scanners, generators,
//! refactoring helpers) called by an AI assistant:
//! - Tool catalog with frequency-tiered loading and keyword search
//! - Bilingual alias and typo-tolerant name resolution
//! - Schema validation of envelopes and tool arguments
//! - Request dispatch with panic containment and normalized error envelopes
//! - Dependency-ordered pipelines with batch and retry variants
//!
//! ## Architecture
//!
//! Everything is built once during setup, frozen, and shared behind `Arc`:
//! ```text
//!                    ┌──────────────────────────────────────┐
//!   JSON-RPC      →  │             Dispatcher               │
//!   envelopes        │  ┌──────────┐ ┌──────────┐           │
//!                    │  │ Registry │ │ Resolver │           │
//!                    │  └──────────┘ └──────────┘           │
//!                    │  ┌──────────┐ ┌──────────┐           │
//!                    │  │  Schema  │ │ Handler  │ → handlers │
//!                    │  │Validator │ │   Map    │           │
//!                    │  └──────────┘ └──────────┘           │
//!                    └──────────────────────────────────────┘
//!                                  ▲
//!                       Pipeline / batch / retry
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

// Re-export public API
pub mod dispatch;
pub mod environment;
pub mod messages;
pub mod pipeline;
pub mod protocol;
pub mod schema;
pub mod server;
pub mod tools;
pub mod types;

// Internal utilities
pub mod observability;

pub use dispatch::{handler_fn, Dispatcher, DispatcherBuilder, ToolContext, ToolError, ToolHandler};
pub use environment::{Environment, Locale};
pub use pipeline::{BatchPolicy, Pipeline, PipelineError, PipelineRun, RetryPolicy, Step};
pub use protocol::{RequestEnvelope, RequestId, ResponseEnvelope, RpcError};
pub use tools::{NameResolver, ToolDescriptor, ToolRegistry};
pub use types::{Config, Error, ErrorCode, Result};
