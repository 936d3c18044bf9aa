//! Bounded-concurrency batch execution.
//!
//! At most `concurrency` items are in flight; outputs keep input order no
//! matter which item finishes first. A failing item never aborts the others.

use super::error::PipelineError;
use crate::dispatch::{with_recovery, Dispatcher, ToolError};
use crate::types::{ErrorCode, PipelineConfig};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;

/// One failed batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItemError {
    /// Position of the item in the input.
    pub index: usize,
    pub code: String,
    pub message: String,
}

/// Result of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    /// Successful outputs in input order; failed items are omitted.
    pub data: Vec<Value>,
    pub errors: Vec<BatchItemError>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.data.len() + self.errors.len()
    }

    /// The partial failure as an error, if any item failed.
    pub fn error(&self) -> Option<PipelineError> {
        (!self.success).then(|| PipelineError::BatchPartialFailure {
            failed: self.errors.len(),
            total: self.total(),
        })
    }
}

/// Apply `operation` to every input with at most `concurrency` in flight.
pub async fn run_batch<I, T, F, Fut>(inputs: I, concurrency: usize, operation: F) -> BatchOutcome
where
    I: IntoIterator<Item = T>,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<Value, ToolError>>,
{
    let operation = &operation;
    // The call itself sits inside the recovered future so a closure that
    // panics before returning its future is contained too.
    let results: Vec<Result<Value, ToolError>> = stream::iter(inputs)
        .map(|item| with_recovery(async move { operation(item).await }, "batch_item"))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut data = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(value) => data.push(value),
            Err(err) => errors.push(BatchItemError {
                index,
                code: err.code().to_string(),
                message: err.message(),
            }),
        }
    }

    if !errors.is_empty() {
        tracing::warn!(
            failed = errors.len(),
            total = data.len() + errors.len(),
            "batch_partial_failure"
        );
    }

    let success = errors.is_empty();
    BatchOutcome {
        success,
        code: (!success).then_some(ErrorCode::BatchPartialFailure),
        data,
        errors,
    }
}

/// Concurrency window for batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    pub concurrency: usize,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl BatchPolicy {
    pub fn new(concurrency: usize) -> Self {
        Self { concurrency }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.batch_concurrency)
    }

    pub async fn run<I, T, F, Fut>(&self, inputs: I, operation: F) -> BatchOutcome
    where
        I: IntoIterator<Item = T>,
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<Value, ToolError>>,
    {
        run_batch(inputs, self.concurrency, operation).await
    }

    pub async fn dispatch(
        &self,
        dispatcher: &Dispatcher,
        tool: &str,
        arguments: Vec<Value>,
    ) -> BatchOutcome {
        dispatch_batch(dispatcher, tool, arguments, self.concurrency).await
    }
}

/// Dispatch the same tool once per argument object.
pub async fn dispatch_batch(
    dispatcher: &Dispatcher,
    tool: &str,
    arguments: Vec<Value>,
    concurrency: usize,
) -> BatchOutcome {
    run_batch(arguments, concurrency, |args| async move {
        dispatcher
            .dispatch(tool, args, None)
            .await
            .map_err(ToolError::from)
    })
    .await
}
