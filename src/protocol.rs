//! JSON-RPC style request/response envelopes.
//!
//! The transport hands the core fully parsed requests and takes back fully
//! formed responses; framing is not handled here.

use crate::types::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const JSONRPC_VERSION: &str = "2.0";

/// Method names served by the dispatcher.
pub mod methods {
    pub const TOOLS_CALL: &str = "tools/call";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_SEARCH: &str = "tools/search";
}

/// Request id: string or number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

/// Incoming request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RequestEnvelope {
    /// A `tools/call` request.
    pub fn tool_call(id: impl Into<RequestId>, name: &str, arguments: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id.into()),
            method: methods::TOOLS_CALL.to_string(),
            params: Some(serde_json::json!({ "name": name, "arguments": arguments })),
        }
    }

    pub fn new(id: impl Into<RequestId>, method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id.into()),
            method: method.to_string(),
            params,
        }
    }
}

/// `params` of a `tools/call` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default = "empty_object")]
    pub arguments: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Error object of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    /// Stable machine-readable code. Handler-classified codes pass through verbatim.
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_str().to_string(),
            message: message.into(),
            data: None,
        }
    }

    pub fn custom(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code.as_str()
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

impl From<crate::types::Error> for RpcError {
    fn from(err: crate::types::Error) -> Self {
        RpcError::new(err.to_error_code(), err.to_string())
    }
}

/// Exactly one of `result` / `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponseOutcome {
    #[serde(rename = "result")]
    Result(Value),
    #[serde(rename = "error")]
    Error(RpcError),
}

/// Outgoing response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub jsonrpc: String,
    pub id: Option<RequestId>,
    #[serde(flatten)]
    pub outcome: ResponseOutcome,
}

impl ResponseEnvelope {
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            outcome: ResponseOutcome::Result(result),
        }
    }

    pub fn failure(id: Option<RequestId>, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            outcome: ResponseOutcome::Error(error),
        }
    }

    pub fn from_result(id: Option<RequestId>, result: Result<Value, RpcError>) -> Self {
        match result {
            Ok(value) => Self::success(id, value),
            Err(error) => Self::failure(id, error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ResponseOutcome::Result(_))
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            ResponseOutcome::Result(value) => Some(value),
            ResponseOutcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&RpcError> {
        match &self.outcome {
            ResponseOutcome::Error(error) => Some(error),
            ResponseOutcome::Result(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_serializes_result_only() {
        let resp = ResponseEnvelope::success(Some(RequestId::Number(7)), json!({"ok": true}));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "id": 7, "result": {"ok": true}}));
    }

    #[test]
    fn test_failure_serializes_error_only() {
        let err = RpcError::new(ErrorCode::UnknownTool, "Unknown tool: 'x'");
        let resp = ResponseEnvelope::failure(Some("abc".into()), err);
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            value,
            json!({
                "jsonrpc": "2.0",
                "id": "abc",
                "error": {"code": "UNKNOWN_TOOL", "message": "Unknown tool: 'x'"}
            })
        );
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_request_id_untagged() {
        let n: RequestId = serde_json::from_value(json!(12)).unwrap();
        let s: RequestId = serde_json::from_value(json!("req-1")).unwrap();
        assert_eq!(n, RequestId::Number(12));
        assert_eq!(s, RequestId::String("req-1".to_string()));
    }

    #[test]
    fn test_tool_call_params_default_arguments() {
        let params: ToolCallParams =
            serde_json::from_value(json!({"name": "scan_secrets"})).unwrap();
        assert_eq!(params.arguments, json!({}));
    }

    #[test]
    fn test_response_round_trip() {
        let resp = ResponseEnvelope::failure(
            None,
            RpcError::custom("SCANNER_TIMEOUT", "took too long").with_data(json!({"after_ms": 10})),
        );
        let value = serde_json::to_value(&resp).unwrap();
        let back: ResponseEnvelope = serde_json::from_value(value).unwrap();
        assert_eq!(back, resp);
        assert_eq!(back.error().unwrap().code, "SCANNER_TIMEOUT");
    }
}
