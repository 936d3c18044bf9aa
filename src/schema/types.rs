//! Declared input schemas: a JSON-Schema subset used for tool arguments.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Primitive schema type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl SchemaType {
    /// Whether a JSON value has this type. Integral floats count as integers.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            SchemaType::String => value.is_string(),
            SchemaType::Number => value.is_number(),
            SchemaType::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
            }
            SchemaType::Boolean => value.is_boolean(),
            SchemaType::Array => value.is_array(),
            SchemaType::Object => value.is_object(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Schema of a single property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySchema {
    /// `None` accepts any JSON type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<SchemaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySchema>>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Nested properties when `kind` is object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, PropertySchema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl PropertySchema {
    pub fn of(kind: SchemaType, description: &str) -> Self {
        Self {
            kind: Some(kind),
            description: Some(description.to_string()),
            ..Default::default()
        }
    }

    pub fn string(description: &str) -> Self {
        Self::of(SchemaType::String, description)
    }

    pub fn integer(description: &str) -> Self {
        Self::of(SchemaType::Integer, description)
    }

    pub fn number(description: &str) -> Self {
        Self::of(SchemaType::Number, description)
    }

    pub fn boolean(description: &str) -> Self {
        Self::of(SchemaType::Boolean, description)
    }

    pub fn array(description: &str, items: PropertySchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(SchemaType::Array, description)
        }
    }

    pub fn object(description: &str) -> Self {
        Self::of(SchemaType::Object, description)
    }

    /// String restricted to the given values.
    pub fn one_of(description: &str, values: &[&str]) -> Self {
        Self {
            enum_values: Some(values.iter().map(|v| Value::from(*v)).collect()),
            ..Self::string(description)
        }
    }

    pub fn with_length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.minimum = min;
        self.maximum = max;
        self
    }

    pub fn with_item_count(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_items = min;
        self.max_items = max;
        self
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Nested object property; marks it required when `required` is true.
    pub fn with_property(mut self, name: &str, schema: PropertySchema, required: bool) -> Self {
        self.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    pub fn closed(mut self) -> Self {
        self.additional_properties = Some(false);
        self
    }

    /// Human-readable type name for prompt generation.
    pub fn display_name(&self) -> String {
        match (self.kind, &self.items) {
            (Some(SchemaType::Array), Some(items)) => format!("{}[]", items.display_name()),
            (Some(kind), _) => kind.as_str().to_string(),
            (None, _) => "any".to_string(),
        }
    }
}

/// Top-level argument schema of a tool. Always an object schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub kind: SchemaType,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default = "default_additional_properties")]
    pub additional_properties: bool,
}

fn default_additional_properties() -> bool {
    true
}

impl Default for InputSchema {
    /// Open schema: no declared properties, anything accepted.
    fn default() -> Self {
        Self {
            kind: SchemaType::Object,
            properties: BTreeMap::new(),
            required: Vec::new(),
            additional_properties: true,
        }
    }
}

impl InputSchema {
    /// Schema that rejects undeclared fields.
    pub fn strict() -> Self {
        Self {
            additional_properties: false,
            ..Self::default()
        }
    }

    pub fn property(mut self, name: &str, schema: PropertySchema) -> Self {
        self.properties.insert(name.to_string(), schema);
        self
    }

    pub fn required_property(mut self, name: &str, schema: PropertySchema) -> Self {
        self.required.push(name.to_string());
        self.property(name, schema)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Every `pattern` declared anywhere in the schema.
    pub fn patterns(&self) -> Vec<&str> {
        fn collect<'a>(schema: &'a PropertySchema, out: &mut Vec<&'a str>) {
            if let Some(p) = &schema.pattern {
                out.push(p);
            }
            if let Some(items) = &schema.items {
                collect(items, out);
            }
            if let Some(props) = &schema.properties {
                for nested in props.values() {
                    collect(nested, out);
                }
            }
        }

        let mut out = Vec::new();
        for schema in self.properties.values() {
            collect(schema, &mut out);
        }
        out
    }

    /// Format: `param1: type, param2?: type`.
    pub fn signature(&self) -> String {
        self.properties
            .iter()
            .map(|(name, schema)| {
                let optional = if self.is_required(name) { "" } else { "?" };
                format!("{}{}: {}", name, optional, schema.display_name())
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_accepts_integral_float() {
        assert!(SchemaType::Integer.accepts(&json!(3)));
        assert!(SchemaType::Integer.accepts(&json!(3.0)));
        assert!(!SchemaType::Integer.accepts(&json!(3.5)));
        assert!(!SchemaType::Integer.accepts(&json!("3")));
    }

    #[test]
    fn test_input_schema_serializes_json_schema_shape() {
        let schema = InputSchema::strict()
            .required_property(
                "path",
                PropertySchema::string("Root path").with_length(Some(1), None),
            )
            .property(
                "depth",
                PropertySchema::integer("Depth").with_range(Some(1.0), Some(10.0)),
            );

        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["type"], "object");
        assert_eq!(value["required"], json!(["path"]));
        assert_eq!(value["additionalProperties"], false);
        assert_eq!(value["properties"]["path"]["minLength"], 1);
        assert_eq!(value["properties"]["depth"]["maximum"], 10.0);
        assert!(value["properties"]["path"].get("maxLength").is_none());
    }

    #[test]
    fn test_schema_round_trips_through_json() {
        let schema = InputSchema::default().property(
            "files",
            PropertySchema::array("Files", PropertySchema::string("File"))
                .with_item_count(Some(1), Some(5)),
        );
        let value = serde_json::to_value(&schema).unwrap();
        let back: InputSchema = serde_json::from_value(value).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn test_signature_marks_optional() {
        let schema = InputSchema::default()
            .required_property("query", PropertySchema::string("q"))
            .property("tags", PropertySchema::array("t", PropertySchema::string("tag")));
        assert_eq!(schema.signature(), "query: string, tags?: string[]");
    }

    #[test]
    fn test_patterns_collects_nested() {
        let schema = InputSchema::default().property(
            "opts",
            PropertySchema::object("o").with_property(
                "name",
                PropertySchema::string("n").with_pattern("^[a-z]+$"),
                true,
            ),
        );
        assert_eq!(schema.patterns(), vec!["^[a-z]+$"]);
    }
}
