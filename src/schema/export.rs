//! Tool definitions as advertised to the calling model.

use super::arguments::ValidationResult;
use crate::tools::{ToolDescriptor, ToolExample};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MIN_EXAMPLE_NAME_LEN: usize = 3;
pub const MIN_EXAMPLE_DESCRIPTION_LEN: usize = 10;

/// Export surface: `{name, description, inputSchema, examples?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<ToolExample>,
}

impl From<&ToolDescriptor> for ToolDefinition {
    fn from(descriptor: &ToolDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            input_schema: serde_json::to_value(&descriptor.input_schema)
                .unwrap_or_else(|_| serde_json::json!({"type": "object"})),
            examples: descriptor.examples.clone(),
        }
    }
}

/// Check a descriptor's examples: required fields present in every input,
/// non-empty outputs, minimum name/description lengths, and inputs that
/// validate against the exported JSON schema.
pub fn check_examples(descriptor: &ToolDescriptor) -> ValidationResult {
    let mut result = ValidationResult::new();
    if descriptor.examples.is_empty() {
        return result;
    }

    let definition = ToolDefinition::from(descriptor);
    let compiled = match jsonschema::validator_for(&definition.input_schema) {
        Ok(validator) => Some(validator),
        Err(e) => {
            result.error(format!(
                "Tool '{}': input schema is not a valid JSON schema: {}",
                descriptor.name, e
            ));
            None
        }
    };

    for example in &descriptor.examples {
        let label = format!("Tool '{}' example '{}'", descriptor.name, example.name);

        if example.name.chars().count() < MIN_EXAMPLE_NAME_LEN {
            result.error(format!(
                "{}: name shorter than {} characters",
                label, MIN_EXAMPLE_NAME_LEN
            ));
        }
        if example.description.chars().count() < MIN_EXAMPLE_DESCRIPTION_LEN {
            result.error(format!(
                "{}: description shorter than {} characters",
                label, MIN_EXAMPLE_DESCRIPTION_LEN
            ));
        }
        if is_empty_value(&example.output) {
            result.error(format!("{}: output is empty", label));
        }

        match example.input.as_object() {
            Some(input) => {
                for field in &descriptor.input_schema.required {
                    if !input.contains_key(field) {
                        result.error(format!(
                            "{}: input is missing required field {}",
                            label, field
                        ));
                    }
                }
            }
            None => result.error(format!("{}: input must be an object", label)),
        }

        if let Some(validator) = &compiled {
            for error in validator.iter_errors(&example.input) {
                result.error(format!("{}: {}", label, error));
            }
        }
    }

    result
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
