//! Request dispatcher.
//!
//! Drives one request through `Received -> NameResolved -> Validated ->
//! Executing -> Responded` (or `Failed`), turning every outcome, including
//! handler panics, into a response value. Everything the dispatcher reads is
//! frozen at build time; the optional health tracker is the only shared
//! mutable state.

pub mod diagnostics;
pub mod handler;
pub mod handlers;
pub mod recovery;
pub mod state;

pub use diagnostics::HealthReport;
pub use handler::{handler_fn, FnHandler, ToolContext, ToolError, ToolHandler};
pub use handlers::{HandlerMap, HandlerMapBuilder};
pub use recovery::with_recovery;
pub use state::{DispatchState, DispatchTrace};

use crate::environment::Environment;
use crate::messages::Messages;
use crate::protocol::{
    methods, RequestEnvelope, RequestId, ResponseEnvelope, RpcError, ToolCallParams,
    JSONRPC_VERSION,
};
use crate::schema::types::value_type_name;
use crate::schema::{validate_request_envelope, SchemaValidator};
use crate::tools::{
    discovery, HealthConfig, NameResolver, SearchQuery, SystemHealthReport, ToolHealthTracker,
    ToolId, ToolRegistry,
};
use crate::pipeline::{BatchOutcome, BatchPolicy};
use crate::types::{Config, CorrelationId, DispatchConfig, Error, ErrorCode, Result};
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

fn lock(tracker: &Mutex<ToolHealthTracker>) -> MutexGuard<'_, ToolHealthTracker> {
    tracker.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Setup-phase builder. Handlers may only be registered here.
#[derive(Debug)]
pub struct DispatcherBuilder {
    registry: Arc<ToolRegistry>,
    resolver: Arc<NameResolver>,
    validator: Arc<SchemaValidator>,
    handlers: HandlerMapBuilder,
    environment: Environment,
    config: DispatchConfig,
    batch: BatchPolicy,
    health: HealthConfig,
}

impl DispatcherBuilder {
    /// Bind a handler to a canonical tool name.
    pub fn register(&mut self, name: &str, handler: Arc<dyn ToolHandler>) -> Result<&mut Self> {
        self.handlers.register(name, handler)?;
        Ok(self)
    }

    /// Bind the core's own discovery tools. Requires them in the registry.
    pub fn register_discovery_handlers(&mut self) -> Result<&mut Self> {
        let handlers = discovery::handlers(&self.registry, &self.resolver, &self.validator);
        for (name, handler) in handlers {
            self.handlers.register(name, handler)?;
        }
        Ok(self)
    }

    pub fn with_environment(&mut self, environment: Environment) -> &mut Self {
        self.environment = environment;
        self
    }

    pub fn resolver(&self) -> &Arc<NameResolver> {
        &self.resolver
    }

    /// Freeze the handler table.
    pub fn build(self) -> Dispatcher {
        let health = self.health.is_active().then(|| {
            let mut tracker = ToolHealthTracker::new(self.health.clone());
            tracker.set_registered_tools(self.registry.iter().map(|d| d.name.clone()).collect());
            Mutex::new(tracker)
        });
        let messages = Messages::new(self.environment.locale);

        Dispatcher {
            registry: self.registry,
            resolver: self.resolver,
            validator: self.validator,
            handlers: self.handlers.build(),
            environment: Arc::new(self.environment),
            messages,
            config: self.config,
            batch: self.batch,
            health,
            started_at: Instant::now(),
        }
    }
}

/// Routes requests to handlers.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    resolver: Arc<NameResolver>,
    validator: Arc<SchemaValidator>,
    handlers: HandlerMap,
    environment: Arc<Environment>,
    messages: Messages,
    config: DispatchConfig,
    batch: BatchPolicy,
    health: Option<Mutex<ToolHealthTracker>>,
    started_at: Instant,
}

impl Dispatcher {
    /// Start building a dispatcher over a frozen registry.
    pub fn builder(registry: Arc<ToolRegistry>, config: &Config) -> Result<DispatcherBuilder> {
        config.validate()?;
        let resolver = Arc::new(NameResolver::new(&registry, &config.resolver));
        let validator = Arc::new(SchemaValidator::for_registry(&registry)?);
        Ok(DispatcherBuilder {
            handlers: HandlerMapBuilder::new(registry.clone()),
            registry,
            resolver,
            validator,
            environment: Environment::default(),
            config: config.dispatch.clone(),
            batch: BatchPolicy::from_config(&config.pipeline),
            health: config.health.clone(),
        })
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn resolver(&self) -> &Arc<NameResolver> {
        &self.resolver
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn has_handler(&self, id: ToolId) -> bool {
        self.handlers.contains(id)
    }

    /// Diagnostics report served under the reserved health name.
    pub fn health_report(&self) -> HealthReport {
        let guard = self.health.as_ref().map(lock);
        HealthReport::collect(
            &self.registry,
            &self.handlers,
            &self.resolver,
            guard.as_deref(),
            &self.environment,
            self.started_at,
        )
    }

    /// Per-tool health, when tracking is enabled.
    pub fn system_health(&self) -> Option<SystemHealthReport> {
        self.health
            .as_ref()
            .map(|tracker| lock(tracker).check_system_health())
    }

    /// Dispatch one tool call.
    pub async fn dispatch(
        &self,
        raw_name: &str,
        arguments: Value,
        request_id: Option<RequestId>,
    ) -> std::result::Result<Value, RpcError> {
        self.dispatch_traced(raw_name, arguments, request_id).await.0
    }

    /// Batch window taken from `pipeline.batch_concurrency`.
    pub fn batch_policy(&self) -> BatchPolicy {
        self.batch
    }

    /// Dispatch `raw_name` once per argument object under the configured
    /// batch window.
    pub async fn dispatch_batch(&self, raw_name: &str, arguments: Vec<Value>) -> BatchOutcome {
        self.batch.dispatch(self, raw_name, arguments).await
    }

    /// Dispatch one tool call and return the states it went through.
    pub async fn dispatch_traced(
        &self,
        raw_name: &str,
        arguments: Value,
        request_id: Option<RequestId>,
    ) -> (std::result::Result<Value, RpcError>, DispatchTrace) {
        let started = Instant::now();
        let correlation_id = CorrelationId::new();
        let mut trace = DispatchTrace::new();
        let mut canonical = None;

        let result = self
            .run(
                raw_name,
                arguments,
                request_id,
                &correlation_id,
                &mut trace,
                &mut canonical,
            )
            .await;
        if result.is_err() {
            trace.fail();
        }

        if self.config.log_requests {
            let tool = canonical.as_deref().unwrap_or(raw_name);
            let duration_ms = started.elapsed().as_millis() as u64;
            match &result {
                Ok(_) => tracing::info!(
                    correlation_id = %correlation_id,
                    tool,
                    raw_name,
                    duration_ms,
                    success = true,
                    "tool_dispatched"
                ),
                Err(err) => tracing::info!(
                    correlation_id = %correlation_id,
                    tool,
                    raw_name,
                    duration_ms,
                    success = false,
                    error_code = %err.code,
                    "tool_dispatched"
                ),
            }
        }

        (result, trace)
    }

    async fn run(
        &self,
        raw_name: &str,
        arguments: Value,
        request_id: Option<RequestId>,
        correlation_id: &CorrelationId,
        trace: &mut DispatchTrace,
        canonical_out: &mut Option<String>,
    ) -> std::result::Result<Value, RpcError> {
        if raw_name == self.config.health_tool_name {
            *canonical_out = Some(raw_name.to_string());
            trace.advance(DispatchState::NameResolved)?;
            trace.advance(DispatchState::Validated)?;
            trace.advance(DispatchState::Executing)?;
            let report = serde_json::to_value(self.health_report()).map_err(Error::from)?;
            trace.advance(DispatchState::Responded)?;
            return Ok(report);
        }

        let Some(resolution) = self.resolver.resolve_detailed(raw_name) else {
            return Err(self.unknown_tool(raw_name));
        };
        let canonical = resolution.canonical;
        *canonical_out = Some(canonical.to_string());
        trace.advance(DispatchState::NameResolved)?;

        if canonical != raw_name {
            tracing::info!(
                correlation_id = %correlation_id,
                raw_name,
                tool = canonical,
                match_kind = ?resolution.kind,
                "tool_name_translated"
            );
        }

        let Some(handler) = self.handlers.get(resolution.id) else {
            return Err(
                RpcError::new(ErrorCode::ToolNotFound, self.messages.tool_not_found(canonical))
                    .with_data(json!({ "tool": canonical })),
            );
        };

        let argument_map = self.check_arguments(resolution.id, canonical, &arguments)?;
        trace.advance(DispatchState::Validated)?;

        if let Some(tracker) = &self.health {
            let allowed = lock(tracker).allow_call(canonical);
            if !allowed {
                return Err(
                    RpcError::new(ErrorCode::CircuitOpen, self.messages.circuit_open(canonical))
                        .with_data(json!({ "tool": canonical })),
                );
            }
        }

        trace.advance(DispatchState::Executing)?;
        let ctx = ToolContext {
            tool_name: canonical.to_string(),
            original_raw_name: raw_name.to_string(),
            arguments,
            environment: self.environment.clone(),
            request_id,
            correlation_id: correlation_id.clone(),
        };

        let started = Instant::now();
        let call = async move { handler.call(argument_map, ctx).await };
        let outcome = with_recovery(call, canonical).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        if let Some(tracker) = &self.health {
            let error_type = outcome.as_ref().err().map(|e| e.code().to_string());
            lock(tracker).record_execution(canonical, outcome.is_ok(), latency_ms, error_type);
        }

        match outcome {
            Ok(value) => {
                trace.advance(DispatchState::Responded)?;
                Ok(value)
            }
            Err(err) => Err(tool_error_to_rpc(canonical, err)),
        }
    }

    fn unknown_tool(&self, raw_name: &str) -> RpcError {
        let suggestions: Vec<&str> = self
            .registry
            .suggest_tools(raw_name)
            .into_iter()
            .map(|hit| hit.descriptor.name.as_str())
            .collect();

        let mut message = self.messages.unknown_tool(raw_name);
        if !suggestions.is_empty() {
            message.push(' ');
            message.push_str(&self.messages.did_you_mean(&suggestions));
        }
        RpcError::new(ErrorCode::UnknownTool, message)
            .with_data(json!({ "input": raw_name, "suggestions": suggestions }))
    }

    fn check_arguments(
        &self,
        id: ToolId,
        canonical: &str,
        arguments: &Value,
    ) -> std::result::Result<Map<String, Value>, RpcError> {
        if self.config.validate_arguments {
            let descriptor = self
                .registry
                .get(id)
                .ok_or_else(|| Error::internal(format!("descriptor for {canonical} missing")))?;
            let result = self.validator.validate(&descriptor.input_schema, arguments);
            if !result.valid {
                return Err(RpcError::new(
                    ErrorCode::InvalidArguments,
                    self.messages.invalid_arguments(canonical, result.errors.len()),
                )
                .with_data(json!({
                    "tool": canonical,
                    "errors": result.errors,
                    "warnings": result.warnings,
                })));
            }
        }

        match arguments {
            Value::Object(map) => Ok(map.clone()),
            other => Err(RpcError::new(
                ErrorCode::InvalidArguments,
                format!("Arguments must be an object, got {}", value_type_name(other)),
            )
            .with_data(json!({ "tool": canonical }))),
        }
    }

    /// Route a parsed JSON-RPC request. The response always carries the
    /// request's id.
    pub async fn handle_request(&self, request: RequestEnvelope) -> ResponseEnvelope {
        let id = request.id.clone();
        if request.jsonrpc != JSONRPC_VERSION {
            let detail = format!("unsupported jsonrpc version '{}'", request.jsonrpc);
            return ResponseEnvelope::failure(id, self.invalid_request(&detail));
        }

        let result = match request.method.as_str() {
            methods::TOOLS_CALL => self.call_tool(request.params, id.clone()).await,
            methods::TOOLS_LIST => Ok(self.list_tools(request.params.as_ref())),
            methods::TOOLS_SEARCH => self.search(request.params),
            other => Err(RpcError::new(
                ErrorCode::MethodNotFound,
                self.messages.method_not_found(other),
            )),
        };
        ResponseEnvelope::from_result(id, result)
    }

    /// Validate a raw JSON request envelope, then route it.
    pub async fn handle_value(&self, value: Value) -> ResponseEnvelope {
        let check = validate_request_envelope(&value);
        if !check.valid {
            let id = value
                .get("id")
                .cloned()
                .and_then(|v| serde_json::from_value::<RequestId>(v).ok());
            let error = self
                .invalid_request(&check.errors.join("; "))
                .with_data(json!({ "errors": check.errors }));
            return ResponseEnvelope::failure(id, error);
        }

        match serde_json::from_value::<RequestEnvelope>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => ResponseEnvelope::failure(None, self.invalid_request(&e.to_string())),
        }
    }

    /// Parse one line of JSON and route it.
    /// Handle one raw request line; bytes that are not UTF-8 get
    /// `INVALID_REQUEST`.
    pub async fn handle_bytes(&self, line: &[u8]) -> ResponseEnvelope {
        match std::str::from_utf8(line) {
            Ok(text) => self.handle_json(text).await,
            Err(e) => ResponseEnvelope::failure(
                None,
                self.invalid_request(&format!("request is not valid UTF-8: {e}")),
            ),
        }
    }

    pub async fn handle_json(&self, line: &str) -> ResponseEnvelope {
        match serde_json::from_str::<Value>(line) {
            Ok(value) => self.handle_value(value).await,
            Err(e) => {
                ResponseEnvelope::failure(None, self.invalid_request(&format!("parse error: {e}")))
            }
        }
    }

    async fn call_tool(
        &self,
        params: Option<Value>,
        id: Option<RequestId>,
    ) -> std::result::Result<Value, RpcError> {
        let params = params.ok_or_else(|| self.invalid_request("Missing required field: params"))?;
        let params: ToolCallParams =
            serde_json::from_value(params).map_err(|e| self.invalid_request(&e.to_string()))?;
        if !params.arguments.is_object() {
            return Err(self.invalid_request(&format!(
                "Field 'params.arguments': expected object, got {}",
                value_type_name(&params.arguments)
            )));
        }
        self.dispatch(&params.name, params.arguments, id).await
    }

    fn list_tools(&self, params: Option<&Value>) -> Value {
        let all = params
            .and_then(|p| p.get("all"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let tools = if all {
            self.registry.export_all()
        } else {
            self.registry.export_immediate()
        };
        json!({
            "tools": tools,
            "deferredCount": self.registry.deferred_tools().len(),
        })
    }

    fn search(&self, params: Option<Value>) -> std::result::Result<Value, RpcError> {
        let query: SearchQuery = match params {
            Some(p) => {
                serde_json::from_value(p).map_err(|e| self.invalid_request(&e.to_string()))?
            }
            None => SearchQuery::default(),
        };
        let hits = self.registry.search_tools(&query);
        Ok(json!({
            "total": hits.len(),
            "tools": hits.iter().map(discovery::hit_to_json).collect::<Vec<_>>(),
        }))
    }

    fn invalid_request(&self, detail: &str) -> RpcError {
        RpcError::new(ErrorCode::InvalidRequest, self.messages.invalid_request(detail))
    }
}

fn tool_error_to_rpc(canonical: &str, err: ToolError) -> RpcError {
    match err {
        ToolError::Classified {
            code,
            message,
            data,
        } => {
            let error = RpcError::custom(code, message);
            match data {
                Some(data) => error.with_data(data),
                None => error,
            }
        }
        ToolError::Unclassified { message, detail } => {
            RpcError::new(ErrorCode::InternalError, message)
                .with_data(json!({ "tool": canonical, "detail": detail }))
        }
        ToolError::Thrown(value) => {
            let message = match &value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            RpcError::new(ErrorCode::InternalError, message)
                .with_data(json!({ "tool": canonical, "thrown": value }))
        }
    }
}
