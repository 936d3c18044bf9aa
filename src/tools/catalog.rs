//! Tool registry: the immutable catalog of tool descriptors.
//!
//! Built once at startup (through [`RegistryBuilder`]) and shared by
//! reference afterwards. Nothing mutates a built registry.

use super::descriptor::{Frequency, ToolCategory, ToolDescriptor, ToolId};
use super::resolver::normalize_name;
use super::search::SearchIndex;
use crate::schema::{check_examples, ToolDefinition};
use crate::types::{Error, Result};
use std::collections::HashMap;

/// Accumulates descriptors and enforces registry invariants.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    descriptors: Vec<ToolDescriptor>,
    by_name: HashMap<String, ToolId>,
    alias_owner: HashMap<String, ToolId>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor.
    ///
    /// Rejects empty or duplicate names, deferred loading on non-low tools,
    /// aliases already claimed by another tool and examples that break the
    /// export invariants. The alias list is normalized so that the canonical
    /// name comes first and normalized duplicates are dropped.
    pub fn register(&mut self, mut descriptor: ToolDescriptor) -> Result<ToolId> {
        if descriptor.name.trim().is_empty() {
            return Err(Error::registry("Tool name cannot be empty"));
        }
        if self.by_name.contains_key(&descriptor.name) {
            return Err(Error::registry(format!(
                "Duplicate tool name: {}",
                descriptor.name
            )));
        }
        if descriptor.defer_loading && descriptor.frequency != Frequency::Low {
            return Err(Error::registry(format!(
                "Tool '{}' is marked defer_loading but has frequency {}",
                descriptor.name,
                descriptor.frequency.as_str()
            )));
        }

        let examples = check_examples(&descriptor);
        if !examples.valid {
            return Err(Error::registry(examples.errors.join("; ")));
        }

        let id = ToolId::from_index(self.descriptors.len());

        let mut aliases = Vec::with_capacity(descriptor.aliases.len() + 1);
        let mut normalized_seen = Vec::new();
        let candidates = std::iter::once(descriptor.name.clone())
            .chain(descriptor.aliases.drain(..))
            .collect::<Vec<_>>();
        for alias in candidates {
            let normalized = normalize_name(&alias);
            if normalized.is_empty() || normalized_seen.contains(&normalized) {
                continue;
            }
            if let Some(owner) = self.alias_owner.get(&normalized) {
                return Err(Error::registry(format!(
                    "Alias '{}' of tool '{}' is already used by tool '{}'",
                    alias, descriptor.name, self.descriptors[owner.index()].name
                )));
            }
            normalized_seen.push(normalized);
            aliases.push(alias);
        }
        descriptor.aliases = aliases;

        for normalized in normalized_seen {
            self.alias_owner.insert(normalized, id);
        }
        self.by_name.insert(descriptor.name.clone(), id);
        self.descriptors.push(descriptor);
        Ok(id)
    }

    /// Freeze into an immutable registry.
    pub fn build(self) -> ToolRegistry {
        let index = SearchIndex::build(&self.descriptors);
        ToolRegistry {
            descriptors: self.descriptors,
            by_name: self.by_name,
            index,
        }
    }
}

/// Immutable tool catalog. Owns metadata, not implementations.
#[derive(Debug)]
pub struct ToolRegistry {
    descriptors: Vec<ToolDescriptor>,
    by_name: HashMap<String, ToolId>,
    pub(super) index: SearchIndex,
}

impl ToolRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Build a registry from a descriptor list, in declaration order.
    pub fn from_descriptors<I>(descriptors: I) -> Result<Self>
    where
        I: IntoIterator<Item = ToolDescriptor>,
    {
        let mut builder = RegistryBuilder::new();
        for descriptor in descriptors {
            builder.register(descriptor)?;
        }
        Ok(builder.build())
    }

    /// The shipped catalog of every tool server.
    pub fn builtin() -> Result<Self> {
        Self::from_descriptors(super::builtin::descriptors())
    }

    pub fn tool_count(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// All descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.descriptors.iter()
    }

    pub fn get(&self, id: ToolId) -> Option<&ToolDescriptor> {
        self.descriptors.get(id.index())
    }

    pub fn id_of(&self, name: &str) -> Option<ToolId> {
        self.by_name.get(name).copied()
    }

    /// Exact canonical lookup. Aliases are not consulted.
    pub fn find_tool_by_name(&self, name: &str) -> Option<&ToolDescriptor> {
        self.id_of(name).and_then(|id| self.get(id))
    }

    /// Tools advertised up front (frequency high).
    pub fn immediate_tools(&self) -> Vec<&ToolDescriptor> {
        self.iter().filter(|d| d.is_immediate()).collect()
    }

    /// Tools discoverable only on demand (frequency medium or low).
    pub fn deferred_tools(&self) -> Vec<&ToolDescriptor> {
        self.iter().filter(|d| !d.is_immediate()).collect()
    }

    /// Tools flagged `defer_loading`.
    pub fn explicitly_deferred_tools(&self) -> Vec<&ToolDescriptor> {
        self.iter().filter(|d| d.defer_loading).collect()
    }

    pub fn tools_by_frequency(&self, frequency: Frequency) -> Vec<&ToolDescriptor> {
        self.iter().filter(|d| d.frequency == frequency).collect()
    }

    pub fn tools_by_server(&self, server: &str) -> Vec<&ToolDescriptor> {
        self.iter().filter(|d| d.server == server).collect()
    }

    pub fn tools_by_category(&self, category: ToolCategory) -> Vec<&ToolDescriptor> {
        self.iter().filter(|d| d.category == category).collect()
    }

    /// Distinct owning servers in declaration order.
    pub fn servers(&self) -> Vec<&str> {
        let mut servers: Vec<&str> = Vec::new();
        for descriptor in &self.descriptors {
            if !servers.contains(&descriptor.server.as_str()) {
                servers.push(&descriptor.server);
            }
        }
        servers
    }

    /// Definitions for the immediate tier.
    pub fn export_immediate(&self) -> Vec<ToolDefinition> {
        self.immediate_tools().into_iter().map(ToolDefinition::from).collect()
    }

    pub fn export_all(&self) -> Vec<ToolDefinition> {
        self.iter().map(ToolDefinition::from).collect()
    }

    /// Generate a formatted catalog section for LLM consumption.
    ///
    /// Format: `- tool_name(param1: type, param2?: type): description`
    pub fn generate_prompt(&self, names: Option<&[String]>) -> String {
        let entries: Vec<&ToolDescriptor> = match names {
            Some(names) => names.iter().filter_map(|n| self.find_tool_by_name(n)).collect(),
            None => self.immediate_tools(),
        };
        if entries.is_empty() {
            return String::new();
        }

        let mut lines = Vec::with_capacity(entries.len() + 1);
        lines.push("Available tools:".to_string());
        for entry in entries {
            lines.push(format!(
                "- {}({}): {}",
                entry.name,
                entry.input_schema.signature(),
                entry.description
            ));
        }
        lines.join("\n")
    }
}
