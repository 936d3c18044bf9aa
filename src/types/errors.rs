//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context. Every variant maps onto a stable,
//! machine-readable [`ErrorCode`] for response envelopes.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable error codes carried in response envelopes.
///
/// Serialized as `SCREAMING_SNAKE_CASE` strings. Handler-classified errors may
/// carry codes outside this set; those travel as plain strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Raw tool name did not resolve to any canonical name.
    UnknownTool,
    /// Canonical name resolved but no handler is registered for it.
    ToolNotFound,
    /// Malformed request or response envelope.
    InvalidRequest,
    /// Arguments violate the tool's declared input schema.
    InvalidArguments,
    /// JSON-RPC method not served by the dispatcher.
    MethodNotFound,
    /// Unclassified handler failure.
    InternalError,
    /// Circuit breaker for the tool is open.
    CircuitOpen,
    /// Pipeline step references an undeclared or unrunnable dependency.
    DependencyError,
    /// Pipeline step failed.
    StepFailed,
    /// One or more batch items failed.
    BatchPartialFailure,
    /// Retry attempts exhausted.
    MaxRetriesExceeded,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::UnknownTool => "UNKNOWN_TOOL",
            ErrorCode::ToolNotFound => "TOOL_NOT_FOUND",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::InvalidArguments => "INVALID_ARGUMENTS",
            ErrorCode::MethodNotFound => "METHOD_NOT_FOUND",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::CircuitOpen => "CIRCUIT_OPEN",
            ErrorCode::DependencyError => "DEPENDENCY_ERROR",
            ErrorCode::StepFailed => "STEP_FAILED",
            ErrorCode::BatchPartialFailure => "BATCH_PARTIAL_FAILURE",
            ErrorCode::MaxRetriesExceeded => "MAX_RETRIES_EXCEEDED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error enum for the toolhub core.
#[derive(Error, Debug)]
pub enum Error {
    /// Validation errors (map to INVALID_REQUEST).
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found (map to TOOL_NOT_FOUND).
    #[error("not found: {0}")]
    NotFound(String),

    /// Registry invariant violated while building the catalog.
    #[error("registry error: {0}")]
    Registry(String),

    /// Internal errors (map to INTERNAL_ERROR).
    #[error("internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Convert to the stable error code used in response envelopes.
    pub fn to_error_code(&self) -> ErrorCode {
        match self {
            Error::Validation(_) => ErrorCode::InvalidRequest,
            Error::NotFound(_) => ErrorCode::ToolNotFound,
            Error::Registry(_)
            | Error::Internal(_)
            | Error::Serialization(_)
            | Error::Io(_) => ErrorCode::InternalError,
        }
    }
}

// Convenience constructors
impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
