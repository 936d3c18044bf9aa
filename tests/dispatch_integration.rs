//! Dispatch integration tests: raw envelope → resolve → validate → handler → response.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use toolhub_core::schema::validate_response_envelope;
use toolhub_core::server::LineServer;
use toolhub_core::tools::builtin;
use toolhub_core::{
    handler_fn, Config, Dispatcher, ErrorCode, RequestEnvelope, ResponseEnvelope, ToolContext,
    ToolError, ToolRegistry,
};

/// Helper: builtin catalog with a counting handler on every tool of the
/// security scanner plus the discovery handlers.
fn build(config: Config) -> (Arc<Dispatcher>, Arc<AtomicUsize>) {
    let registry = Arc::new(ToolRegistry::builtin().unwrap());
    let calls = Arc::new(AtomicUsize::new(0));
    let mut builder = Dispatcher::builder(registry.clone(), &config).unwrap();
    for descriptor in registry.tools_by_server(builtin::SECURITY_SCANNER) {
        let calls = calls.clone();
        builder
            .register(
                &descriptor.name,
                handler_fn(move |args, ctx: ToolContext| {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(json!({ "tool": ctx.tool_name, "args": args }))
                    }
                }),
            )
            .unwrap();
    }
    builder.register_discovery_handlers().unwrap();
    (Arc::new(builder.build()), calls)
}

async fn call(dispatcher: &Dispatcher, request: Value) -> ResponseEnvelope {
    dispatcher.handle_value(request).await
}

fn tool_call(id: i64, name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments },
    })
}

#[tokio::test]
async fn test_every_alias_of_every_tool_resolves_to_its_handler() {
    let (dispatcher, calls) = build(Config::default());
    let registry = dispatcher.registry().clone();
    let mut expected_calls = 0;

    for descriptor in registry.tools_by_server(builtin::SECURITY_SCANNER) {
        let arguments = if descriptor.name == "scan_dependencies" {
            json!({ "manifest": "Cargo.toml" })
        } else {
            json!({ "path": "." })
        };
        for alias in &descriptor.aliases {
            let resp = call(&dispatcher, tool_call(7, alias, arguments.clone())).await;
            assert!(resp.is_success(), "{alias}: {:?}", resp.error());
            assert_eq!(resp.result().unwrap()["tool"], descriptor.name.as_str());
            expected_calls += 1;
        }
    }
    assert_eq!(calls.load(Ordering::SeqCst), expected_calls);
}

#[tokio::test]
async fn test_separator_and_case_insensitive_aliases() {
    let (dispatcher, _) = build(Config::default());
    for raw in ["SCAN_SECRETS", "Scan Secrets", "scan-secrets", "Secret_Scan"] {
        let resp = call(&dispatcher, tool_call(1, raw, json!({ "path": "." }))).await;
        assert_eq!(resp.result().unwrap()["tool"], "scan_secrets", "{raw}");
    }
}

#[tokio::test]
async fn test_validation_failure_never_reaches_handler() {
    let (dispatcher, calls) = build(Config::default());

    let resp = call(&dispatcher, tool_call(1, "scan_secrets", json!({}))).await;
    let err = resp.error().unwrap();
    assert!(err.is(ErrorCode::InvalidArguments));
    assert_eq!(err.data.as_ref().unwrap()["errors"], json!(["Missing required field: path"]));

    let resp = call(
        &dispatcher,
        tool_call(2, "scan_secrets", json!({ "path": ".", "verbose": true })),
    )
    .await;
    let errors = &resp.error().unwrap().data.as_ref().unwrap()["errors"];
    assert!(errors[0].as_str().unwrap().contains("verbose"));

    let resp = call(
        &dispatcher,
        tool_call(3, "scan_secrets", json!({ "path": ".", "severity": "apocalyptic" })),
    )
    .await;
    assert!(resp.error().unwrap().is(ErrorCode::InvalidArguments));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_and_unhandled_tools() {
    let (dispatcher, calls) = build(Config::default());

    let resp = call(&dispatcher, tool_call(1, "definitely_not_a_tool", json!({}))).await;
    assert!(resp.error().unwrap().is(ErrorCode::UnknownTool));

    let resp = call(&dispatcher, tool_call(2, "generate_tests", json!({ "path": "a.rs" }))).await;
    assert!(resp.error().unwrap().is(ErrorCode::ToolNotFound));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_health_name_succeeds_without_any_handlers() {
    let registry = Arc::new(ToolRegistry::builtin().unwrap());
    let dispatcher = Dispatcher::builder(registry, &Config::default())
        .unwrap()
        .build();
    let resp = call(&dispatcher, tool_call(1, "__health", json!({}))).await;
    let result = resp.result().unwrap();
    assert_eq!(result["status"], "degraded");
    assert_eq!(result["checks"]["handlers"]["registered"], 0);
    for key in ["status", "checks", "issues", "timestamp", "uptime", "version", "environment"] {
        assert!(result.get(key).is_some(), "missing {key}");
    }
}

#[tokio::test]
async fn test_responses_are_well_formed_envelopes() {
    let (dispatcher, _) = build(Config::default());
    let requests = [
        tool_call(1, "scan_secrets", json!({ "path": "." })),
        tool_call(2, "nope_nope_nope", json!({})),
        json!({ "jsonrpc": "2.0", "id": 3, "method": "tools/list" }),
        json!({
            "jsonrpc": "2.0",
            "id": "four",
            "method": "tools/search",
            "params": { "query": "secret" },
        }),
        json!({ "jsonrpc": "2.0", "id": 5, "method": "prompts/list" }),
    ];
    for request in requests {
        let id = request["id"].clone();
        let resp = call(&dispatcher, request).await;
        let encoded = serde_json::to_value(&resp).unwrap();
        let check = validate_response_envelope(&encoded, Some(&id));
        assert!(check.valid, "{encoded}: {:?}", check.errors);
    }
}

#[tokio::test]
async fn test_discovery_round_trip() {
    let (dispatcher, _) = build(Config::default());

    let resp = call(&dispatcher, tool_call(1, "도구검색", json!({ "query": "telemetry" }))).await;
    let result = resp.result().unwrap();
    let names: Vec<&str> = result["tools"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert!(names.contains(&"telemetry_report"));

    let resp = call(
        &dispatcher,
        tool_call(2, "resolve_tool_name", json!({ "name": "비밀키검사" })),
    )
    .await;
    assert_eq!(resp.result().unwrap()["canonical"], "scan_secrets");
}

#[tokio::test]
async fn test_classified_code_survives_envelope() {
    let registry = Arc::new(ToolRegistry::builtin().unwrap());
    let mut builder = Dispatcher::builder(registry, &Config::default()).unwrap();
    builder
        .register(
            "scan_dependencies",
            handler_fn(|_, _| async {
                Err(ToolError::classified("ADVISORY_DB_UNAVAILABLE", "advisory database offline"))
            }),
        )
        .unwrap();
    let dispatcher = builder.build();

    let resp = dispatcher
        .handle_request(RequestEnvelope::tool_call(
            9,
            "dep-scan",
            json!({ "manifest": "package.json" }),
        ))
        .await;
    let err = resp.error().unwrap();
    assert_eq!(err.code, "ADVISORY_DB_UNAVAILABLE");
    assert_eq!(err.message, "advisory database offline");
}

#[tokio::test]
async fn test_concurrent_requests_share_one_dispatcher() {
    let (dispatcher, calls) = build(Config::default());
    let mut handles = Vec::new();
    for i in 0..32 {
        let dispatcher = dispatcher.clone();
        handles.push(tokio::spawn(async move {
            dispatcher
                .dispatch("vuln-scan", json!({ "path": format!("src/{i}") }), None)
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 32);
}

#[tokio::test]
async fn test_line_server_round_trip() {
    let (dispatcher, _) = build(Config::default());
    let server = LineServer::new(dispatcher);
    let input = [
        tool_call(1, "시크릿스캔", json!({ "path": "." })).to_string(),
        json!({ "jsonrpc": "1.0", "id": 2, "method": "tools/list" }).to_string(),
    ]
    .join("\n");

    let (mut client, server_side) = tokio::io::duplex(1 << 20);
    server.serve(input.as_bytes(), server_side).await.unwrap();

    let mut output = String::new();
    tokio::io::AsyncReadExt::read_to_string(&mut client, &mut output)
        .await
        .unwrap();
    let mut responses: Vec<Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    responses.sort_by_key(|r| r["id"].as_i64());

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["result"]["tool"], "scan_secrets");
    assert_eq!(responses[1]["error"]["code"], "INVALID_REQUEST");
    assert_eq!(responses[1]["id"], 2);
}
