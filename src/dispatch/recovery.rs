//! Panic recovery for handler invocations.
//!
//! A panicking handler must never take the host process down with it: the
//! panic is captured, logged and converted into an unclassified tool error.

use super::handler::ToolError;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Await `future`, converting a panic into [`ToolError::Unclassified`].
pub async fn with_recovery<Fut, T>(future: Fut, operation_name: &str) -> Result<T, ToolError>
where
    Fut: Future<Output = Result<T, ToolError>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(panic_payload) => {
            let panic_msg = extract_panic_message(panic_payload.as_ref());
            tracing::error!(
                operation = operation_name,
                panic = %panic_msg,
                "panic_recovered"
            );
            Err(ToolError::Unclassified {
                message: format!("Panic in {}: {}", operation_name, panic_msg),
                detail: Some(panic_msg),
            })
        }
    }
}

/// Extract panic message from panic payload.
pub(crate) fn extract_panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
