//! Protocol-level envelope checks.
//!
//! These run on raw JSON before deserialization so that malformed envelopes
//! produce precise messages instead of a generic parse failure.

use super::arguments::ValidationResult;
use super::types::value_type_name;
use crate::protocol::{methods, JSONRPC_VERSION};
use serde_json::Value;

fn check_id(value: &Value, result: &mut ValidationResult) {
    match value.get("id") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(Value::Number(n)) if n.is_i64() => {}
        Some(other) => result.error(format!(
            "Field 'id': expected string or integer, got {}",
            value_type_name(other)
        )),
    }
}

fn check_version(value: &Value, result: &mut ValidationResult) {
    match value.get("jsonrpc") {
        None => result.error("Missing required field: jsonrpc"),
        Some(Value::String(v)) if v == JSONRPC_VERSION => {}
        Some(other) => result.error(format!(
            "Field 'jsonrpc': expected \"{}\", got {}",
            JSONRPC_VERSION, other
        )),
    }
}

/// Validate a raw request envelope.
pub fn validate_request_envelope(value: &Value) -> ValidationResult {
    let mut result = ValidationResult::new();
    if !value.is_object() {
        result.error(format!(
            "Request must be an object, got {}",
            value_type_name(value)
        ));
        return result;
    }

    check_version(value, &mut result);
    check_id(value, &mut result);

    let method = match value.get("method") {
        None => {
            result.error("Missing required field: method");
            None
        }
        Some(Value::String(m)) if m.is_empty() => {
            result.error("Field 'method': length 0 is below minLength 1");
            None
        }
        Some(Value::String(m)) => Some(m.as_str()),
        Some(other) => {
            result.error(format!(
                "Field 'method': expected string, got {}",
                value_type_name(other)
            ));
            None
        }
    };

    let params = value.get("params");
    match params {
        None | Some(Value::Object(_)) => {}
        Some(other) => result.error(format!(
            "Field 'params': expected object, got {}",
            value_type_name(other)
        )),
    }

    if method == Some(methods::TOOLS_CALL) {
        match params.and_then(Value::as_object) {
            None if params.is_none() => result.error("Missing required field: params"),
            None => {}
            Some(p) => {
                match p.get("name") {
                    None => result.error("Missing required field: params.name"),
                    Some(Value::String(_)) => {}
                    Some(other) => result.error(format!(
                        "Field 'params.name': expected string, got {}",
                        value_type_name(other)
                    )),
                }
                match p.get("arguments") {
                    None | Some(Value::Object(_)) => {}
                    Some(other) => result.error(format!(
                        "Field 'params.arguments': expected object, got {}",
                        value_type_name(other)
                    )),
                }
            }
        }
    }

    result
}

/// Validate a raw response envelope. When the request carried an id, the
/// response id must equal it.
pub fn validate_response_envelope(value: &Value, request_id: Option<&Value>) -> ValidationResult {
    let mut result = ValidationResult::new();
    if !value.is_object() {
        result.error(format!(
            "Response must be an object, got {}",
            value_type_name(value)
        ));
        return result;
    }

    check_version(value, &mut result);
    check_id(value, &mut result);

    match (value.get("result"), value.get("error")) {
        (Some(_), Some(_)) => result.error("Response must not contain both result and error"),
        (None, None) => result.error("Response must contain exactly one of result or error"),
        (None, Some(error)) => check_error_object(error, &mut result),
        (Some(_), None) => {}
    }

    if let Some(expected) = request_id.filter(|id| !id.is_null()) {
        match value.get("id") {
            Some(actual) if actual == expected => {}
            Some(actual) => result.error(format!(
                "Response id {} does not match request id {}",
                actual, expected
            )),
            None => result.error(format!(
                "Response id missing, expected request id {}",
                expected
            )),
        }
    }

    result
}

fn check_error_object(error: &Value, result: &mut ValidationResult) {
    let Some(obj) = error.as_object() else {
        result.error(format!(
            "Field 'error': expected object, got {}",
            value_type_name(error)
        ));
        return;
    };

    match obj.get("code") {
        None => result.error("Missing required field: error.code"),
        Some(Value::String(_)) => {}
        Some(Value::Number(n)) if n.is_i64() => {}
        Some(other) => result.error(format!(
            "Field 'error.code': expected string or integer, got {}",
            value_type_name(other)
        )),
    }
    match obj.get("message") {
        None => result.error("Missing required field: error.message"),
        Some(Value::String(_)) => {}
        Some(other) => result.error(format!(
            "Field 'error.message': expected string, got {}",
            value_type_name(other)
        )),
    }
}
