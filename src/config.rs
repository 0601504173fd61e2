//! Application configuration.
//!
//! A config file declares logging, the modules to instantiate and any named
//! pipelines over them:
//!
//! ```json
//! {
//!   "logging": {"level": "info", "format": "json"},
//!   "modules": [
//!     {"name": "prod-regions", "type": "platform.region",
//!      "config": {"provider": "mock", "regions": [{"name": "us-east-1", "priority": "primary"}]}}
//!   ],
//!   "pipelines": [
//!     {"name": "deploy", "steps": [
//!       {"name": "east", "type": "step.region_deploy",
//!        "config": {"module": "prod-regions", "region": "us-east-1"}}
//!     ]}
//!   ]
//! }
//! ```

use crate::core::{Error, Result};
use crate::monitoring::LoggingConfig;
use crate::pipeline::{Pipeline, StepDefinition, StepRegistry};
use crate::region::{Orchestrator, OrchestratorConfig};
use crate::registry::ServiceRegistry;
use crate::routing::{RoutingConfig, RoutingSelector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Module type for a region orchestrator.
pub const REGION_MODULE: &str = "platform.region";
/// Module type for a routing selector.
pub const ROUTER_MODULE: &str = "platform.region_router";

/// A module to instantiate and register.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub module_type: String,
    #[serde(default)]
    pub config: Value,
}

/// A named list of steps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub modules: Vec<ModuleDefinition>,
    #[serde(default)]
    pub pipelines: Vec<PipelineDefinition>,
}

impl AppConfig {
    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Configuration(e.to_string()))
    }

    /// Load from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Instantiate every module and register it under its name.
    pub fn build_registry(&self) -> Result<Arc<ServiceRegistry>> {
        let registry = Arc::new(ServiceRegistry::new());
        for module in &self.modules {
            let config = match &module.config {
                Value::Null => Value::Object(Default::default()),
                other => other.clone(),
            };
            match module.module_type.as_str() {
                REGION_MODULE => {
                    Orchestrator::init(&module.name, OrchestratorConfig::from_value(config)?, &registry)?;
                }
                ROUTER_MODULE => {
                    RoutingSelector::init(&module.name, RoutingConfig::from_value(config)?, &registry)?;
                }
                other => {
                    return Err(Error::Configuration(format!(
                        "module {:?}: unknown type {:?}",
                        module.name, other
                    )))
                }
            }
            tracing::debug!(module = %module.name, module_type = %module.module_type, "module registered");
        }
        Ok(registry)
    }

    /// Build the named pipeline against a registry.
    pub fn build_pipeline(
        &self,
        name: &str,
        steps: &StepRegistry,
        services: Arc<ServiceRegistry>,
    ) -> Result<Pipeline> {
        let definition = self
            .pipelines
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::Configuration(format!("pipeline {:?} not defined", name)))?;
        Pipeline::build(&definition.name, &definition.steps, steps, services)
    }
}
