//! Orchestration errors.

use crate::protocol::RpcError;
use crate::types::ErrorCode;
use serde_json::json;
use thiserror::Error;

/// Failure that aborts a pipeline, batch or retry loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("step '{step}' depends on undeclared step '{dependency}'")]
    UndeclaredDependency { step: String, dependency: String },

    #[error("step '{0}' is declared more than once")]
    DuplicateStep(String),

    #[error("dependency cycle among steps: {}", .steps.join(", "))]
    Cycle { steps: Vec<String> },

    #[error("step '{step}' failed: {message}")]
    StepFailed {
        step: String,
        code: String,
        message: String,
    },

    #[error("{failed} of {total} batch items failed")]
    BatchPartialFailure { failed: usize, total: usize },

    #[error("gave up after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

impl PipelineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PipelineError::UndeclaredDependency { .. }
            | PipelineError::DuplicateStep(_)
            | PipelineError::Cycle { .. } => ErrorCode::DependencyError,
            PipelineError::StepFailed { .. } => ErrorCode::StepFailed,
            PipelineError::BatchPartialFailure { .. } => ErrorCode::BatchPartialFailure,
            PipelineError::MaxRetriesExceeded { .. } => ErrorCode::MaxRetriesExceeded,
        }
    }

    /// Name of the step the error is attributed to, if any.
    pub fn step(&self) -> Option<&str> {
        match self {
            PipelineError::UndeclaredDependency { step, .. }
            | PipelineError::StepFailed { step, .. } => Some(step),
            PipelineError::DuplicateStep(step) => Some(step),
            _ => None,
        }
    }
}

impl From<PipelineError> for RpcError {
    fn from(err: PipelineError) -> Self {
        let data = match &err {
            PipelineError::UndeclaredDependency { step, dependency } => {
                json!({ "step": step, "dependency": dependency })
            }
            PipelineError::DuplicateStep(step) => json!({ "step": step }),
            PipelineError::Cycle { steps } => json!({ "steps": steps }),
            PipelineError::StepFailed { step, code, .. } => json!({ "step": step, "cause": code }),
            PipelineError::BatchPartialFailure { failed, total } => {
                json!({ "failed": failed, "total": total })
            }
            PipelineError::MaxRetriesExceeded { attempts, last_error } => {
                json!({ "attempts": attempts, "lastError": last_error })
            }
        };
        RpcError::new(err.code(), err.to_string()).with_data(data)
    }
}
