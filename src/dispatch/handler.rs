//! Handler interface between the dispatcher and tool implementations.

use crate::environment::Environment;
use crate::protocol::{RequestId, RpcError};
use crate::types::{CorrelationId, ErrorCode};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Per-call context handed to a handler.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Canonical name the call resolved to.
    pub tool_name: String,
    /// Name exactly as the caller sent it.
    pub original_raw_name: String,
    /// The argument object as received.
    pub arguments: Value,
    pub environment: Arc<Environment>,
    pub request_id: Option<RequestId>,
    pub correlation_id: CorrelationId,
}

/// Failure reported by a handler.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ToolError {
    /// Handler-chosen code, passed through to the response verbatim.
    #[error("{code}: {message}")]
    Classified {
        code: String,
        message: String,
        data: Option<Value>,
    },

    /// Ordinary failure without a code of its own.
    #[error("{message}")]
    Unclassified {
        message: String,
        detail: Option<String>,
    },

    /// A non-error value surfaced as a failure.
    #[error("{}", thrown_message(.0))]
    Thrown(Value),
}

impl ToolError {
    pub fn classified(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Classified {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }

    pub fn coded(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::classified(code.as_str(), message)
    }

    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::Unclassified {
            message: message.into(),
            detail: None,
        }
    }

    /// Attach structured data (classified) or a detail string (unclassified).
    pub fn with_data(self, value: Value) -> Self {
        match self {
            Self::Classified { code, message, .. } => Self::Classified {
                code,
                message,
                data: Some(value),
            },
            Self::Unclassified { message, .. } => Self::Unclassified {
                message,
                detail: Some(thrown_message(&value)),
            },
            thrown @ Self::Thrown(_) => thrown,
        }
    }

    /// Code the dispatcher will put on the response.
    pub fn code(&self) -> &str {
        match self {
            Self::Classified { code, .. } => code,
            Self::Unclassified { .. } | Self::Thrown(_) => ErrorCode::InternalError.as_str(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Classified { message, .. } | Self::Unclassified { message, .. } => {
                message.clone()
            }
            Self::Thrown(value) => thrown_message(value),
        }
    }
}

impl From<crate::types::Error> for ToolError {
    fn from(err: crate::types::Error) -> Self {
        Self::coded(err.to_error_code(), err.to_string())
    }
}

/// A dispatched call's error, re-raised from inside another operation.
impl From<RpcError> for ToolError {
    fn from(err: RpcError) -> Self {
        Self::Classified {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unclassified {
            message: "failed to decode arguments".to_string(),
            detail: Some(err.to_string()),
        }
    }
}

fn thrown_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A tool implementation.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(
        &self,
        arguments: Map<String, Value>,
        ctx: ToolContext,
    ) -> Result<Value, ToolError>;
}

/// Adapter turning an async closure into a [`ToolHandler`].
pub struct FnHandler<F> {
    f: F,
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Map<String, Value>, ToolContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ToolError>> + Send,
{
    async fn call(
        &self,
        arguments: Map<String, Value>,
        ctx: ToolContext,
    ) -> Result<Value, ToolError> {
        (self.f)(arguments, ctx).await
    }
}

/// Wrap an async closure as a shareable handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ToolHandler>
where
    F: Fn(Map<String, Value>, ToolContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}
