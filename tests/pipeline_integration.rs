//! Pipeline integration tests: steps, batches and retries driven through a real dispatcher.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use toolhub_core::pipeline::{dispatch_batch, run_batch, BatchItemError};
use toolhub_core::schema::{InputSchema, PropertySchema};
use toolhub_core::tools::{Frequency, ToolCategory, ToolDescriptor};
use toolhub_core::{
    handler_fn, Config, Dispatcher, ErrorCode, Pipeline, PipelineError, RetryPolicy, Step,
    ToolError, ToolRegistry,
};

const SERVER: &str = "dependency-auditor";

fn registry() -> ToolRegistry {
    ToolRegistry::from_descriptors([
        ToolDescriptor::new(
            "fetch_manifest",
            SERVER,
            Frequency::High,
            ToolCategory::Analysis,
            "Read a manifest and list its dependencies",
        )
        .schema(
            InputSchema::strict()
                .required_property("path", PropertySchema::string("Manifest path")),
        ),
        ToolDescriptor::new(
            "score_risk",
            SERVER,
            Frequency::High,
            ToolCategory::Security,
            "Score dependency risk from upstream results",
        )
        .schema(
            InputSchema::strict()
                .property(
                    "inputs",
                    PropertySchema::array("Upstream outputs", PropertySchema::default()),
                )
                .required_property("weight", PropertySchema::integer("Risk multiplier")),
        ),
        ToolDescriptor::new(
            "square",
            SERVER,
            Frequency::Medium,
            ToolCategory::Analysis,
            "Square a number, refusing three",
        )
        .schema(InputSchema::strict().required_property("n", PropertySchema::integer("Operand"))),
        ToolDescriptor::new(
            "flaky_probe",
            SERVER,
            Frequency::Low,
            ToolCategory::Diagnostics,
            "Fails until the third call",
        ),
    ])
    .unwrap()
}

fn dispatcher() -> (Arc<Dispatcher>, Arc<AtomicUsize>) {
    let probe_calls = Arc::new(AtomicUsize::new(0));
    let counter = probe_calls.clone();
    let mut builder = Dispatcher::builder(Arc::new(registry()), &Config::default()).unwrap();
    builder
        .register(
            "fetch_manifest",
            handler_fn(|args, _| async move {
                Ok(json!({ "path": args["path"], "deps": ["serde", "tokio", "regex"] }))
            }),
        )
        .unwrap()
        .register(
            "score_risk",
            handler_fn(|args, _| async move {
                let deps = args["inputs"][0]["deps"].as_array().map_or(0, Vec::len) as i64;
                let weight = args["weight"].as_i64().unwrap_or(1);
                Ok(json!({ "risk": deps * weight }))
            }),
        )
        .unwrap()
        .register(
            "square",
            handler_fn(|args, _| async move {
                let n = args["n"].as_i64().unwrap_or_default();
                if n == 3 {
                    return Err(ToolError::classified("UNLUCKY", "three is refused"));
                }
                Ok(json!(n * n))
            }),
        )
        .unwrap()
        .register(
            "flaky_probe",
            handler_fn(move |_, _| {
                let counter = counter.clone();
                async move {
                    let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if call < 3 {
                        Err(ToolError::unclassified(format!("probe attempt {call} timed out")))
                    } else {
                        Ok(json!({ "attempt": call }))
                    }
                }
            }),
        )
        .unwrap();
    (Arc::new(builder.build()), probe_calls)
}

#[tokio::test]
async fn test_tool_steps_pass_outputs_downstream() {
    let (d, _) = dispatcher();
    let run = Pipeline::new()
        .step(
            Step::tool("risk", d.clone(), "score_risk", json!({ "weight": 2 }))
                .depends_on(["manifest"]),
        )
        .step(Step::tool(
            "manifest",
            d.clone(),
            "fetch_manifest",
            json!({ "path": "Cargo.toml" }),
        ))
        .run()
        .await;

    assert!(run.is_success(), "{:?}", run.error());
    assert_eq!(run.completed(), &["manifest", "risk"]);
    assert_eq!(run.result("risk"), Some(&json!({ "risk": 6 })));
}

#[tokio::test]
async fn test_dispatch_error_becomes_step_failed() {
    let (d, _) = dispatcher();
    let run = Pipeline::new()
        .step(Step::tool("manifest", d.clone(), "fetch_manifest", json!({ "path": "a" })))
        .step(Step::tool("bad", d.clone(), "no_such_tool_here", json!({})).depends_on(["manifest"]))
        .run()
        .await;

    let err = run.error().unwrap();
    assert_eq!(err.code(), ErrorCode::StepFailed);
    match err {
        PipelineError::StepFailed { step, code, message } => {
            assert_eq!(step, "bad");
            assert_eq!(code, "UNKNOWN_TOOL");
            assert!(message.starts_with("Unknown tool: 'no_such_tool_here'"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(run.result("manifest").is_some());
}

#[tokio::test]
async fn test_missing_declaration_is_dependency_error() {
    let (d, _) = dispatcher();
    let pipeline = Pipeline::new().step(
        Step::tool("risk", d.clone(), "score_risk", json!({ "weight": 1 }))
            .depends_on(["manifest"]),
    );
    assert_eq!(
        pipeline.execution_order().unwrap_err().code(),
        ErrorCode::DependencyError
    );
    let run = pipeline.run().await;
    assert_eq!(run.error().map(PipelineError::code), Some(ErrorCode::DependencyError));
}

#[tokio::test]
async fn test_batch_over_dispatcher_keeps_order_and_reports_failure() {
    let (d, _) = dispatcher();
    let arguments = (1..=5).map(|n| json!({ "n": n })).collect();
    let outcome = d.dispatch_batch("square", arguments).await;

    assert!(!outcome.success);
    assert_eq!(outcome.code, Some(ErrorCode::BatchPartialFailure));
    assert_eq!(outcome.data, vec![json!(1), json!(4), json!(16), json!(25)]);
    assert_eq!(
        outcome.errors,
        vec![BatchItemError {
            index: 2,
            code: "UNLUCKY".into(),
            message: "three is refused".into(),
        }]
    );

    let encoded = serde_json::to_value(&outcome).unwrap();
    assert_eq!(encoded["code"], "BATCH_PARTIAL_FAILURE");
}

#[tokio::test]
async fn test_batch_of_invalid_arguments() {
    let (d, _) = dispatcher();
    let arguments = vec![json!({ "n": 2 }), json!({ "n": "two" })];
    let outcome = dispatch_batch(&d, "square", arguments, 2).await;
    assert_eq!(outcome.data, vec![json!(4)]);
    assert_eq!(outcome.errors[0].code, "INVALID_ARGUMENTS");
}

#[tokio::test]
async fn test_retry_recovers_flaky_tool() {
    let (d, calls) = dispatcher();
    let policy = RetryPolicy::new(3, Duration::from_millis(5));
    let out = policy
        .run(|_| {
            let d = d.clone();
            async move { d.dispatch("flaky_probe", json!({}), None).await.map_err(ToolError::from) }
        })
        .await
        .unwrap();
    assert_eq!(out, json!({ "attempt": 3 }));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retry_exhaustion() {
    let (d, calls) = dispatcher();
    let policy = RetryPolicy::new(2, Duration::from_millis(5));
    let err = policy
        .run(|_| {
            let d = d.clone();
            async move { d.dispatch("flaky_probe", json!({}), None).await.map_err(ToolError::from) }
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        PipelineError::MaxRetriesExceeded {
            attempts: 2,
            last_error: "probe attempt 2 timed out".into(),
        }
    );
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_run_batch_with_plain_closure() {
    let outcome = run_batch(["a", "bb", "ccc"], 2, |s| async move {
        Ok::<Value, ToolError>(json!(s.len()))
    })
    .await;
    assert!(outcome.success);
    assert_eq!(outcome.data, vec![json!(1), json!(2), json!(3)]);
}
