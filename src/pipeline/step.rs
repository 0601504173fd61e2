//! Pipeline step contract and a minimal sequential runner.
//!
//! Steps are built from declarative definitions (`type` plus a flat config
//! map) by a registered factory, then executed in order. Each step's output is
//! merged into the shared context for the steps after it.

use crate::core::types::int_from_value;
use crate::core::{Error, Result};
use crate::registry::ServiceRegistry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Flat step configuration.
pub type StepConfig = Map<String, Value>;

/// Output of a single step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepResult {
    pub output: Map<String, Value>,
}

impl StepResult {
    /// Build a result from a JSON object. Non-object values yield an empty output.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(output) => Self { output },
            _ => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.output.get(key)
    }
}

/// Data shared across the steps of one pipeline run.
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    /// Merged outputs of all steps run so far
    pub current: Map<String, Value>,
    /// Output of each step, by step name
    pub step_outputs: HashMap<String, Map<String, Value>>,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn merge(&mut self, step: &str, result: &StepResult) {
        for (k, v) in &result.output {
            self.current.insert(k.clone(), v.clone());
        }
        self.step_outputs.insert(step.to_string(), result.output.clone());
    }
}

/// A single executable pipeline step.
#[async_trait]
pub trait PipelineStep: Send + Sync {
    /// Step name from the pipeline definition.
    fn name(&self) -> &str;

    /// Run the step.
    async fn execute(&self, ctx: &PipelineContext) -> Result<StepResult>;
}

/// Builds a step from its name and config.
pub type StepFactory = fn(&str, &StepConfig, Arc<ServiceRegistry>) -> Result<Box<dyn PipelineStep>>;

/// Read a required, non-empty string field.
pub fn required_str(step: &str, config: &StepConfig, key: &str) -> Result<String> {
    match config.get(key).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(Error::StepConfig {
            step: step.to_string(),
            message: format!("'{}' is required", key),
        }),
    }
}

/// Read a required integer field (integral floats accepted).
pub fn required_int(step: &str, config: &StepConfig, key: &str) -> Result<i64> {
    config
        .get(key)
        .and_then(int_from_value)
        .ok_or_else(|| Error::StepConfig {
            step: step.to_string(),
            message: format!("'{}' is required (integer)", key),
        })
}

/// Declarative step definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Step name
    pub name: String,
    /// Step type (e.g. `step.region_deploy`)
    #[serde(rename = "type")]
    pub step_type: String,
    /// Step config
    #[serde(default)]
    pub config: StepConfig,
}

impl StepDefinition {
    pub fn new(name: &str, step_type: &str, config: Value) -> Self {
        let config = match config {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            name: name.to_string(),
            step_type: step_type.to_string(),
            config,
        }
    }
}

/// Maps step type names to factories.
#[derive(Default)]
pub struct StepRegistry {
    factories: HashMap<String, StepFactory>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for a step type.
    pub fn register(&mut self, step_type: &str, factory: StepFactory) {
        self.factories.insert(step_type.to_string(), factory);
    }

    /// Whether a step type is known.
    pub fn contains(&self, step_type: &str) -> bool {
        self.factories.contains_key(step_type)
    }

    /// Registered step types, sorted.
    pub fn step_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }

    /// Build a step from a definition.
    pub fn build(&self, definition: &StepDefinition, services: Arc<ServiceRegistry>) -> Result<Box<dyn PipelineStep>> {
        let factory = self.factories.get(&definition.step_type).ok_or_else(|| Error::StepConfig {
            step: definition.name.clone(),
            message: format!("unknown step type {:?}", definition.step_type),
        })?;
        factory(&definition.name, &definition.config, services)
    }
}

/// An ordered list of steps.
pub struct Pipeline {
    name: String,
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    /// Build every step up front; any config error fails the whole pipeline.
    pub fn build(
        name: &str,
        definitions: &[StepDefinition],
        steps: &StepRegistry,
        services: Arc<ServiceRegistry>,
    ) -> Result<Self> {
        let steps = definitions
            .iter()
            .map(|d| steps.build(d, Arc::clone(&services)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: name.to_string(),
            steps,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run all steps in order, halting at the first failure.
    pub async fn run(&self) -> Result<PipelineContext> {
        let mut ctx = PipelineContext::new();
        for step in &self.steps {
            tracing::debug!(pipeline = %self.name, step = step.name(), "executing step");
            let result = step.execute(&ctx).await.map_err(|e| {
                tracing::error!(pipeline = %self.name, step = step.name(), error = %e, "step failed");
                e
            })?;
            ctx.merge(step.name(), &result);
        }
        Ok(ctx)
    }
}
