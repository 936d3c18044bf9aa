//! Discovery tools served by the core itself.
//!
//! These let a model that only sees the immediate tier find, resolve and
//! pre-validate everything else in the catalog.

use super::catalog::ToolRegistry;
use super::resolver::{MatchKind, NameResolver};
use super::search::{SearchHit, SearchQuery};
use crate::dispatch::{ToolContext, ToolError, ToolHandler};
use crate::schema::SchemaValidator;
use crate::types::ErrorCode;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub const SEARCH_TOOLS: &str = "search_tools";
pub const SUGGEST_TOOLS: &str = "suggest_tools";
pub const RESOLVE_TOOL_NAME: &str = "resolve_tool_name";
pub const GET_TOOL_ALIASES: &str = "get_tool_aliases";
pub const VALIDATE_TOOL_ARGUMENTS: &str = "validate_tool_arguments";

/// JSON view of a search hit.
pub fn hit_to_json(hit: &SearchHit<'_>) -> Value {
    let d = hit.descriptor;
    json!({
        "name": d.name,
        "server": d.server,
        "category": d.category.as_str(),
        "frequency": d.frequency.as_str(),
        "description": d.description,
        "deferLoading": d.defer_loading,
        "relevance": hit.relevance,
    })
}

fn required_str<'a>(arguments: &'a Map<String, Value>, field: &str) -> Result<&'a str, ToolError> {
    arguments
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ToolError::coded(
                ErrorCode::InvalidArguments,
                format!("Missing required field: {field}"),
            )
        })
}

fn resolve_or_unknown<'a>(resolver: &'a NameResolver, raw: &str) -> Result<&'a str, ToolError> {
    resolver.resolve(raw).ok_or_else(|| {
        ToolError::coded(ErrorCode::UnknownTool, format!("Unknown tool: '{raw}'"))
    })
}

#[derive(Debug)]
pub struct SearchToolsHandler {
    registry: Arc<ToolRegistry>,
}

#[async_trait]
impl ToolHandler for SearchToolsHandler {
    async fn call(
        &self,
        arguments: Map<String, Value>,
        _ctx: ToolContext,
    ) -> Result<Value, ToolError> {
        let query: SearchQuery = serde_json::from_value(Value::Object(arguments))
            .map_err(|e| ToolError::coded(ErrorCode::InvalidArguments, e.to_string()))?;
        let hits = self.registry.search_tools(&query);
        Ok(json!({
            "total": hits.len(),
            "tools": hits.iter().map(hit_to_json).collect::<Vec<_>>(),
        }))
    }
}

#[derive(Debug)]
pub struct SuggestToolsHandler {
    registry: Arc<ToolRegistry>,
}

#[async_trait]
impl ToolHandler for SuggestToolsHandler {
    async fn call(
        &self,
        arguments: Map<String, Value>,
        _ctx: ToolContext,
    ) -> Result<Value, ToolError> {
        let context = required_str(&arguments, "context")?;
        let hits = self.registry.suggest_tools(context);
        Ok(json!({
            "suggestions": hits.iter().map(hit_to_json).collect::<Vec<_>>(),
        }))
    }
}

#[derive(Debug)]
pub struct ResolveToolNameHandler {
    resolver: Arc<NameResolver>,
}

#[async_trait]
impl ToolHandler for ResolveToolNameHandler {
    async fn call(
        &self,
        arguments: Map<String, Value>,
        _ctx: ToolContext,
    ) -> Result<Value, ToolError> {
        let raw = required_str(&arguments, "name")?;
        let value = match self.resolver.resolve_detailed(raw) {
            Some(resolution) => {
                let (kind, distance) = match resolution.kind {
                    MatchKind::Exact => ("exact", 0),
                    MatchKind::Fuzzy { distance } => ("fuzzy", distance),
                };
                json!({
                    "input": raw,
                    "canonical": resolution.canonical,
                    "match": kind,
                    "distance": distance,
                })
            }
            None => json!({
                "input": raw,
                "canonical": null,
                "match": null,
            }),
        };
        Ok(value)
    }
}

#[derive(Debug)]
pub struct GetToolAliasesHandler {
    resolver: Arc<NameResolver>,
}

#[async_trait]
impl ToolHandler for GetToolAliasesHandler {
    async fn call(
        &self,
        arguments: Map<String, Value>,
        _ctx: ToolContext,
    ) -> Result<Value, ToolError> {
        let raw = required_str(&arguments, "name")?;
        let canonical = resolve_or_unknown(&self.resolver, raw)?;
        let aliases = self.resolver.get_tool_aliases(canonical).unwrap_or_default();
        Ok(json!({
            "name": canonical,
            "aliases": aliases,
        }))
    }
}

#[derive(Debug)]
pub struct ValidateToolArgumentsHandler {
    registry: Arc<ToolRegistry>,
    resolver: Arc<NameResolver>,
    validator: Arc<SchemaValidator>,
}

#[async_trait]
impl ToolHandler for ValidateToolArgumentsHandler {
    async fn call(
        &self,
        arguments: Map<String, Value>,
        _ctx: ToolContext,
    ) -> Result<Value, ToolError> {
        let raw = required_str(&arguments, "name")?;
        let canonical = resolve_or_unknown(&self.resolver, raw)?;
        let descriptor = self.registry.find_tool_by_name(canonical).ok_or_else(|| {
            let message = format!("Tool '{canonical}' is not registered");
            ToolError::coded(ErrorCode::ToolNotFound, message)
        })?;
        let candidate = arguments.get("arguments").cloned().unwrap_or(Value::Null);
        let result = self.validator.validate(&descriptor.input_schema, &candidate);
        Ok(json!({
            "name": canonical,
            "valid": result.valid,
            "errors": result.errors,
            "warnings": result.warnings,
        }))
    }
}

/// The discovery handlers, keyed by canonical name.
pub fn handlers(
    registry: &Arc<ToolRegistry>,
    resolver: &Arc<NameResolver>,
    validator: &Arc<SchemaValidator>,
) -> Vec<(&'static str, Arc<dyn ToolHandler>)> {
    let search: Arc<dyn ToolHandler> = Arc::new(SearchToolsHandler {
        registry: registry.clone(),
    });
    let suggest: Arc<dyn ToolHandler> = Arc::new(SuggestToolsHandler {
        registry: registry.clone(),
    });
    let resolve: Arc<dyn ToolHandler> = Arc::new(ResolveToolNameHandler {
        resolver: resolver.clone(),
    });
    let aliases: Arc<dyn ToolHandler> = Arc::new(GetToolAliasesHandler {
        resolver: resolver.clone(),
    });
    let validate: Arc<dyn ToolHandler> = Arc::new(ValidateToolArgumentsHandler {
        registry: registry.clone(),
        resolver: resolver.clone(),
        validator: validator.clone(),
    });

    vec![
        (SEARCH_TOOLS, search),
        (SUGGEST_TOOLS, suggest),
        (RESOLVE_TOOL_NAME, resolve),
        (GET_TOOL_ALIASES, aliases),
        (VALIDATE_TOOL_ARGUMENTS, validate),
    ]
}
