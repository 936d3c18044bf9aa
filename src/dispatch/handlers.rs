//! Handler table keyed by [`ToolId`].
//!
//! Populated during setup through [`HandlerMapBuilder`], then frozen. Reads
//! after freezing are plain slice indexing, with no lock.

use super::handler::ToolHandler;
use crate::tools::{ToolId, ToolRegistry};
use crate::types::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// Mutable setup-phase view of the handler table.
pub struct HandlerMapBuilder {
    registry: Arc<ToolRegistry>,
    slots: Vec<Option<Arc<dyn ToolHandler>>>,
}

impl HandlerMapBuilder {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        let slots = vec![None; registry.tool_count()];
        Self { registry, slots }
    }

    /// Bind a handler to a canonical tool name.
    ///
    /// Fails when the name is not in the registry or already has a handler.
    pub fn register(&mut self, name: &str, handler: Arc<dyn ToolHandler>) -> Result<ToolId> {
        let id = self.registry.id_of(name).ok_or_else(|| {
            Error::not_found(format!("Cannot register handler for unknown tool '{name}'"))
        })?;
        let slot = &mut self.slots[id.index()];
        if slot.is_some() {
            return Err(Error::registry(format!("Handler for '{name}' registered twice")));
        }
        *slot = Some(handler);
        Ok(id)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registry
            .id_of(name)
            .is_some_and(|id| self.slots[id.index()].is_some())
    }

    pub fn build(self) -> HandlerMap {
        HandlerMap { slots: self.slots }
    }
}

impl fmt::Debug for HandlerMapBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerMapBuilder")
            .field("registered", &self.slots.iter().filter(|s| s.is_some()).count())
            .field("capacity", &self.slots.len())
            .finish()
    }
}

/// Frozen handler table.
#[derive(Clone)]
pub struct HandlerMap {
    slots: Vec<Option<Arc<dyn ToolHandler>>>,
}

impl HandlerMap {
    pub fn get(&self, id: ToolId) -> Option<&Arc<dyn ToolHandler>> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn contains(&self, id: ToolId) -> bool {
        self.get(id).is_some()
    }

    /// Number of tools with a handler.
    pub fn registered_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Ids of registry tools without a handler.
    pub fn missing(&self) -> Vec<ToolId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| ToolId::from_index(i))
            .collect()
    }
}

impl fmt::Debug for HandlerMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerMap")
            .field("registered", &self.registered_count())
            .field("capacity", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::handler_fn;
    use crate::tools::{Frequency, ToolCategory, ToolDescriptor};
    use serde_json::json;

    fn registry() -> Arc<ToolRegistry> {
        Arc::new(
            ToolRegistry::from_descriptors(vec![
                ToolDescriptor::new("a_tool", "s", Frequency::High, ToolCategory::Analysis, "A"),
                ToolDescriptor::new("b_tool", "s", Frequency::Low, ToolCategory::Analysis, "B"),
            ])
            .unwrap(),
        )
    }

    fn noop() -> Arc<dyn ToolHandler> {
        handler_fn(|_, _| async { Ok(json!(null)) })
    }

    #[test]
    fn test_register_and_freeze() {
        let reg = registry();
        let mut builder = HandlerMapBuilder::new(reg.clone());
        let id = builder.register("a_tool", noop()).unwrap();
        assert!(builder.is_registered("a_tool"));
        assert!(!builder.is_registered("b_tool"));

        let map = builder.build();
        assert!(map.contains(id));
        assert_eq!(map.registered_count(), 1);
        assert_eq!(map.missing(), vec![reg.id_of("b_tool").unwrap()]);
    }

    #[test]
    fn test_register_unknown_tool_fails() {
        let mut builder = HandlerMapBuilder::new(registry());
        let err = builder.register("nope", noop()).unwrap_err();
        assert!(err.to_string().contains("unknown tool 'nope'"));
    }

    #[test]
    fn test_register_twice_fails() {
        let mut builder = HandlerMapBuilder::new(registry());
        builder.register("a_tool", noop()).unwrap();
        assert!(builder.register("a_tool", noop()).is_err());
    }
}
