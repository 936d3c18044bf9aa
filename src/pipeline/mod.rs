//! Dependency-ordered execution of chained operations.
//!
//! Steps run one at a time in a topological order of their declared
//! dependencies; ties keep declaration order. Each step receives the outputs
//! of its dependencies in the order it declared them. The first failure
//! aborts the run, and everything that already completed stays readable on
//! the returned [`PipelineRun`].

pub mod batch;
pub mod error;
pub mod retry;

pub use batch::{dispatch_batch, run_batch, BatchItemError, BatchOutcome, BatchPolicy};
pub use error::PipelineError;
pub use retry::RetryPolicy;

use crate::dispatch::{with_recovery, Dispatcher, ToolError};
use crate::types::RunId;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

type StepFn = dyn Fn(Vec<Value>) -> BoxFuture<'static, Result<Value, ToolError>> + Send + Sync;

/// One named unit of work.
#[derive(Clone)]
pub struct Step {
    name: String,
    depends_on: Vec<String>,
    execute: Arc<StepFn>,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}

impl Step {
    pub fn new<F, Fut>(name: impl Into<String>, execute: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
            execute: Arc::new(move |inputs| execute(inputs).boxed()),
        }
    }

    /// A step that dispatches `tool` with `arguments`.
    ///
    /// When the step has dependencies, their outputs are added to the
    /// argument object under `inputs`, so the tool's schema must accept it.
    pub fn tool(
        name: impl Into<String>,
        dispatcher: Arc<Dispatcher>,
        tool: impl Into<String>,
        arguments: Value,
    ) -> Self {
        let tool = tool.into();
        Self::new(name, move |inputs| {
            let dispatcher = dispatcher.clone();
            let tool = tool.clone();
            let mut arguments = arguments.clone();
            async move {
                if !inputs.is_empty() {
                    if let Value::Object(map) = &mut arguments {
                        map.insert("inputs".to_string(), Value::Array(inputs));
                    }
                }
                dispatcher
                    .dispatch(&tool, arguments, None)
                    .await
                    .map_err(ToolError::from)
            }
        })
    }

    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }
}

/// Ordered collection of steps.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Kahn's algorithm over declared edges, smallest declaration index first.
    ///
    /// Dependencies on undeclared steps do not constrain the order; they are
    /// reported when the dependent step is reached. Steps left over because
    /// of a cycle are returned separately.
    fn plan(&self) -> Result<(Vec<usize>, Vec<usize>), PipelineError> {
        let mut index_of: HashMap<&str, usize> = HashMap::with_capacity(self.steps.len());
        for (i, step) in self.steps.iter().enumerate() {
            if index_of.insert(step.name.as_str(), i).is_some() {
                return Err(PipelineError::DuplicateStep(step.name.clone()));
            }
        }

        let mut in_degree = vec![0_usize; self.steps.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.steps.len()];
        for (i, step) in self.steps.iter().enumerate() {
            for dep in &step.depends_on {
                if let Some(&j) = index_of.get(dep.as_str()) {
                    in_degree[i] += 1;
                    dependents[j].push(i);
                }
            }
        }

        let mut ready: BTreeSet<usize> = (0..self.steps.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.steps.len());
        while let Some(i) = ready.pop_first() {
            order.push(i);
            for &next in &dependents[i] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.insert(next);
                }
            }
        }

        let stuck = (0..self.steps.len()).filter(|&i| in_degree[i] > 0).collect();
        Ok((order, stuck))
    }

    /// Step names in execution order, or the error that prevents a full run.
    pub fn execution_order(&self) -> Result<Vec<&str>, PipelineError> {
        let (order, stuck) = self.plan()?;
        if let Some(err) = self.cycle_error(&stuck) {
            return Err(err);
        }
        for &i in &order {
            let step = &self.steps[i];
            if let Some(missing) = step.depends_on.iter().find(|d| !self.declares(d)) {
                return Err(PipelineError::UndeclaredDependency {
                    step: step.name.clone(),
                    dependency: missing.clone(),
                });
            }
        }
        Ok(order.into_iter().map(|i| self.steps[i].name.as_str()).collect())
    }

    fn declares(&self, name: &str) -> bool {
        self.steps.iter().any(|s| s.name == name)
    }

    fn cycle_error(&self, stuck: &[usize]) -> Option<PipelineError> {
        (!stuck.is_empty()).then(|| PipelineError::Cycle {
            steps: stuck.iter().map(|&i| self.steps[i].name.clone()).collect(),
        })
    }

    /// Execute every step. Never panics; the outcome is on the returned run.
    pub async fn run(&self) -> PipelineRun {
        let mut run = PipelineRun::new();
        let (order, stuck) = match self.plan() {
            Ok(plan) => plan,
            Err(err) => {
                run.abort(err);
                return run;
            }
        };

        tracing::debug!(run_id = %run.run_id, steps = self.steps.len(), "pipeline_started");

        for i in order {
            let step = &self.steps[i];
            let mut inputs = Vec::with_capacity(step.depends_on.len());
            for dep in &step.depends_on {
                match run.results.get(dep) {
                    Some(output) => inputs.push(output.clone()),
                    None => {
                        run.abort(PipelineError::UndeclaredDependency {
                            step: step.name.clone(),
                            dependency: dep.clone(),
                        });
                        return run;
                    }
                }
            }

            let started = Instant::now();
            let execute = async move { (step.execute)(inputs).await };
            match with_recovery(execute, &step.name).await {
                Ok(output) => {
                    tracing::debug!(
                        run_id = %run.run_id,
                        step = %step.name,
                        duration_ms = started.elapsed().as_millis() as u64,
                        "pipeline_step_completed"
                    );
                    run.completed.push(step.name.clone());
                    run.results.insert(step.name.clone(), output);
                }
                Err(err) => {
                    run.abort(PipelineError::StepFailed {
                        step: step.name.clone(),
                        code: err.code().to_string(),
                        message: err.message(),
                    });
                    return run;
                }
            }
        }

        if let Some(err) = self.cycle_error(&stuck) {
            run.abort(err);
        }
        run
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    run_id: RunId,
    results: HashMap<String, Value>,
    completed: Vec<String>,
    error: Option<PipelineError>,
}

impl PipelineRun {
    fn new() -> Self {
        Self {
            run_id: RunId::new(),
            results: HashMap::new(),
            completed: Vec::new(),
            error: None,
        }
    }

    fn abort(&mut self, err: PipelineError) {
        tracing::warn!(
            run_id = %self.run_id,
            code = %err.code(),
            error = %err,
            completed = self.completed.len(),
            "pipeline_aborted"
        );
        self.error = Some(err);
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Output of a completed step.
    pub fn result(&self, step: &str) -> Option<&Value> {
        self.results.get(step)
    }

    /// Names of completed steps, in the order they ran.
    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    pub fn error(&self) -> Option<&PipelineError> {
        self.error.as_ref()
    }

    pub fn into_result(self) -> Result<HashMap<String, Value>, PipelineError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.results),
        }
    }
}
