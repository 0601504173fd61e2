//! Pipeline Module
//!
//! Declarative step surface for the orchestrator:
//! - Step trait, factories and a sequential runner
//! - Region steps (deploy, failover, promote, status, weight, sync)

pub mod region_steps;
pub mod step;

pub use region_steps::register_region_steps;
pub use step::{
    Pipeline, PipelineContext, PipelineStep, StepConfig, StepDefinition, StepFactory, StepRegistry, StepResult,
};
