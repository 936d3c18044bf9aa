//! Argument validation against declared input schemas.
//!
//! Produces one message per failed constraint, naming the field path and the
//! bound that was violated. A request is valid iff no error was recorded.

use super::types::{value_type_name, InputSchema, PropertySchema};
use crate::tools::ToolRegistry;
use crate::types::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Outcome of a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
        self.valid = false;
    }

    pub fn warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Validates argument objects. Patterns are compiled once up front when the
/// validator is built for a registry; ad-hoc schemas compile on demand.
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator {
    patterns: HashMap<String, Regex>,
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Precompile every pattern declared by the registry's descriptors.
    pub fn for_registry(registry: &ToolRegistry) -> Result<Self> {
        let mut patterns = HashMap::new();
        for descriptor in registry.iter() {
            for pattern in descriptor.input_schema.patterns() {
                if patterns.contains_key(pattern) {
                    continue;
                }
                let regex = Regex::new(pattern).map_err(|e| {
                    Error::registry(format!(
                        "tool '{}' declares an invalid pattern '{}': {}",
                        descriptor.name, pattern, e
                    ))
                })?;
                patterns.insert(pattern.to_string(), regex);
            }
        }
        Ok(Self { patterns })
    }

    /// Validate an argument value against a tool's input schema.
    pub fn validate(&self, schema: &InputSchema, arguments: &Value) -> ValidationResult {
        let mut result = ValidationResult::new();
        match arguments {
            Value::Object(map) => self.validate_object(
                "",
                &schema.properties,
                &schema.required,
                schema.additional_properties,
                map,
                &mut result,
            ),
            other => result.error(format!(
                "Arguments must be an object, got {}",
                value_type_name(other)
            )),
        }
        result
    }

    fn validate_object(
        &self,
        prefix: &str,
        properties: &BTreeMap<String, PropertySchema>,
        required: &[String],
        additional_allowed: bool,
        map: &Map<String, Value>,
        result: &mut ValidationResult,
    ) {
        for name in required {
            if !map.contains_key(name) {
                result.error(format!("Missing required field: {}", join_path(prefix, name)));
            }
        }

        for (key, value) in map {
            let path = join_path(prefix, key);
            match properties.get(key) {
                Some(schema) => self.validate_value(&path, schema, value, result),
                None if additional_allowed => {
                    result.warning(format!("Field '{}' is not declared in the schema", path))
                }
                None => result.error(format!("Unexpected field: {}", path)),
            }
        }
    }

    fn validate_value(
        &self,
        path: &str,
        schema: &PropertySchema,
        value: &Value,
        result: &mut ValidationResult,
    ) {
        if let Some(kind) = schema.kind {
            if !kind.accepts(value) {
                result.error(format!(
                    "Field '{}': expected {}, got {}",
                    path,
                    kind,
                    value_type_name(value)
                ));
                return;
            }
        }

        if let Some(allowed) = &schema.enum_values {
            if !allowed.contains(value) {
                let options: Vec<String> = allowed.iter().map(Value::to_string).collect();
                result.error(format!(
                    "Field '{}': value {} is not one of [{}]",
                    path,
                    value,
                    options.join(", ")
                ));
            }
        }

        match value {
            Value::String(s) => self.check_string(path, schema, s, result),
            Value::Number(n) => {
                if let Some(v) = n.as_f64() {
                    check_number(path, schema, v, value, result);
                }
            }
            Value::Array(items) => self.check_array(path, schema, items, result),
            Value::Object(map) => {
                if let Some(props) = &schema.properties {
                    self.validate_object(
                        path,
                        props,
                        &schema.required,
                        schema.additional_properties.unwrap_or(true),
                        map,
                        result,
                    );
                } else if !schema.required.is_empty() {
                    self.validate_object(
                        path,
                        &BTreeMap::new(),
                        &schema.required,
                        true,
                        map,
                        result,
                    );
                }
            }
            Value::Null | Value::Bool(_) => {}
        }
    }

    fn check_string(
        &self,
        path: &str,
        schema: &PropertySchema,
        s: &str,
        result: &mut ValidationResult,
    ) {
        let len = s.chars().count();
        if let Some(min) = schema.min_length {
            if len < min {
                result.error(format!(
                    "Field '{}': length {} is below minLength {}",
                    path, len, min
                ));
            }
        }
        if let Some(max) = schema.max_length {
            if len > max {
                result.error(format!(
                    "Field '{}': length {} exceeds maxLength {}",
                    path, len, max
                ));
            }
        }
        if let Some(pattern) = &schema.pattern {
            let compiled;
            let regex = match self.patterns.get(pattern) {
                Some(regex) => regex,
                None => match Regex::new(pattern) {
                    Ok(regex) => {
                        compiled = regex;
                        &compiled
                    }
                    Err(_) => {
                        result.error(format!(
                            "Field '{}': schema pattern '{}' is not a valid regular expression",
                            path, pattern
                        ));
                        return;
                    }
                },
            };
            if !regex.is_match(s) {
                result.error(format!(
                    "Field '{}': value does not match pattern '{}'",
                    path, pattern
                ));
            }
        }
    }

    fn check_array(
        &self,
        path: &str,
        schema: &PropertySchema,
        items: &[Value],
        result: &mut ValidationResult,
    ) {
        let count = items.len();
        if let Some(min) = schema.min_items {
            if count < min {
                result.error(format!(
                    "Field '{}': {} items is below minItems {}",
                    path, count, min
                ));
            }
        }
        if let Some(max) = schema.max_items {
            if count > max {
                result.error(format!(
                    "Field '{}': {} items exceeds maxItems {}",
                    path, count, max
                ));
            }
        }
        if let Some(item_schema) = &schema.items {
            for (i, item) in items.iter().enumerate() {
                self.validate_value(&format!("{}[{}]", path, i), item_schema, item, result);
            }
        }
    }
}

fn check_number(
    path: &str,
    schema: &PropertySchema,
    v: f64,
    raw: &Value,
    result: &mut ValidationResult,
) {
    if let Some(min) = schema.minimum {
        if v < min {
            result.error(format!(
                "Field '{}': value {} is below minimum {}",
                path, raw, min
            ));
        }
    }
    if let Some(max) = schema.maximum {
        if v > max {
            result.error(format!(
                "Field '{}': value {} exceeds maximum {}",
                path, raw, max
            ));
        }
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}
