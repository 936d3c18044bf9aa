//! Tool descriptors: the immutable metadata advertised for every operation.

use crate::schema::InputSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Dense index of a descriptor inside a built registry (declaration order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ToolId(u32);

impl ToolId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Expected invocation frequency. Drives immediate vs. deferred advertising.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    High,
    Medium,
    Low,
}

impl Frequency {
    /// Sort rank: high sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Frequency::High => 0,
            Frequency::Medium => 1,
            Frequency::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::High => "high",
            Frequency::Medium => "medium",
            Frequency::Low => "low",
        }
    }
}

/// Tool category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    Security,
    Testing,
    Generation,
    Refactoring,
    Analysis,
    Diagnostics,
    Telemetry,
    Configuration,
    Discovery,
}

impl ToolCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolCategory::Security => "security",
            ToolCategory::Testing => "testing",
            ToolCategory::Generation => "generation",
            ToolCategory::Refactoring => "refactoring",
            ToolCategory::Analysis => "analysis",
            ToolCategory::Diagnostics => "diagnostics",
            ToolCategory::Telemetry => "telemetry",
            ToolCategory::Configuration => "configuration",
            ToolCategory::Discovery => "discovery",
        }
    }
}

/// A worked example attached to an exported tool definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExample {
    pub name: String,
    pub description: String,
    pub input: Value,
    pub output: Value,
}

impl ToolExample {
    pub fn new(name: &str, description: &str, input: Value, output: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input,
            output,
        }
    }
}

/// Complete tool metadata entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Canonical id, unique across the registry.
    pub name: String,
    /// Owning subsystem.
    pub server: String,
    pub frequency: Frequency,
    pub category: ToolCategory,
    pub keywords: BTreeSet<String>,
    pub description: String,
    /// Hidden from the advertised catalog; only valid for low-frequency tools.
    pub defer_loading: bool,
    /// Ordered alias list; the registry guarantees `aliases[0] == name`.
    pub aliases: Vec<String>,
    pub input_schema: InputSchema,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<ToolExample>,
}

impl ToolDescriptor {
    pub fn new(
        name: &str,
        server: &str,
        frequency: Frequency,
        category: ToolCategory,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            server: server.to_string(),
            frequency,
            category,
            keywords: BTreeSet::new(),
            description: description.to_string(),
            defer_loading: false,
            aliases: vec![name.to_string()],
            input_schema: InputSchema::default(),
            examples: Vec::new(),
        }
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn deferred(mut self) -> Self {
        self.defer_loading = true;
        self
    }

    pub fn schema(mut self, schema: InputSchema) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn example(mut self, example: ToolExample) -> Self {
        self.examples.push(example);
        self
    }

    /// Advertised up front (frequency high).
    pub fn is_immediate(&self) -> bool {
        self.frequency == Frequency::High
    }
}
