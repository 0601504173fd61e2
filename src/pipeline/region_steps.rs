//! Pipeline steps driving a [`Orchestrator`].
//!
//! Each step names the orchestrator module it targets and resolves it from
//! the service registry at execution time.

use crate::core::{Error, Result};
use crate::pipeline::step::{
    required_int, required_str, PipelineContext, PipelineStep, StepConfig, StepRegistry, StepResult,
};
use crate::region::Orchestrator;
use crate::registry::ServiceRegistry;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub const REGION_DEPLOY: &str = "step.region_deploy";
pub const REGION_FAILOVER: &str = "step.region_failover";
pub const REGION_PROMOTE: &str = "step.region_promote";
pub const REGION_STATUS: &str = "step.region_status";
pub const REGION_WEIGHT: &str = "step.region_weight";
pub const REGION_SYNC: &str = "step.region_sync";

impl StepRegistry {
    /// Registry preloaded with every region step.
    pub fn with_region_steps() -> Self {
        let mut steps = Self::new();
        register_region_steps(&mut steps);
        steps
    }
}

/// Register all region step factories.
pub fn register_region_steps(steps: &mut StepRegistry) {
    steps.register(REGION_DEPLOY, RegionDeployStep::factory);
    steps.register(REGION_FAILOVER, RegionFailoverStep::factory);
    steps.register(REGION_PROMOTE, RegionPromoteStep::factory);
    steps.register(REGION_STATUS, RegionStatusStep::factory);
    steps.register(REGION_WEIGHT, RegionWeightStep::factory);
    steps.register(REGION_SYNC, RegionSyncStep::factory);
}

fn resolve_orchestrator(services: &ServiceRegistry, module: &str, step: &str) -> Result<Arc<Orchestrator>> {
    services.resolve::<Orchestrator>(module).map_err(|e| {
        let source = match e {
            Error::ServiceTypeMismatch { name, .. } => Error::ServiceTypeMismatch {
                name,
                expected: "region orchestrator",
            },
            other => other,
        };
        failed(step)(source)
    })
}

fn failed(step: &str) -> impl FnOnce(Error) -> Error {
    let step = step.to_string();
    move |source| Error::StepFailed {
        step,
        source: Box::new(source),
    }
}

/// Deploys to a specific region.
pub struct RegionDeployStep {
    name: String,
    module: String,
    region: String,
    services: Arc<ServiceRegistry>,
}

impl RegionDeployStep {
    pub fn factory(name: &str, config: &StepConfig, services: Arc<ServiceRegistry>) -> Result<Box<dyn PipelineStep>> {
        Ok(Box::new(Self {
            name: name.to_string(),
            module: required_str(name, config, "module")?,
            region: required_str(name, config, "region")?,
            services,
        }))
    }
}

#[async_trait]
impl PipelineStep for RegionDeployStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &PipelineContext) -> Result<StepResult> {
        let m = resolve_orchestrator(&self.services, &self.module, &self.name)?;
        m.deploy(&self.region).await.map_err(failed(&self.name))?;
        let state = m.status().await.map_err(failed(&self.name))?;
        Ok(StepResult::from_json(json!({
            "module": self.module,
            "region": self.region,
            "status": state.status,
        })))
    }
}

/// Fails traffic over from one region to another.
pub struct RegionFailoverStep {
    name: String,
    module: String,
    from: String,
    to: String,
    services: Arc<ServiceRegistry>,
}

impl RegionFailoverStep {
    pub fn factory(name: &str, config: &StepConfig, services: Arc<ServiceRegistry>) -> Result<Box<dyn PipelineStep>> {
        Ok(Box::new(Self {
            name: name.to_string(),
            module: required_str(name, config, "module")?,
            from: required_str(name, config, "from")?,
            to: required_str(name, config, "to")?,
            services,
        }))
    }
}

#[async_trait]
impl PipelineStep for RegionFailoverStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &PipelineContext) -> Result<StepResult> {
        let m = resolve_orchestrator(&self.services, &self.module, &self.name)?;
        m.failover(&self.from, &self.to).await.map_err(failed(&self.name))?;
        let state = m.status().await.map_err(failed(&self.name))?;
        Ok(StepResult::from_json(json!({
            "module": self.module,
            "from": self.from,
            "to": self.to,
            "activeRegion": state.active_region,
            "status": state.status,
        })))
    }
}

/// Promotes a region to primary.
pub struct RegionPromoteStep {
    name: String,
    module: String,
    region: String,
    services: Arc<ServiceRegistry>,
}

impl RegionPromoteStep {
    pub fn factory(name: &str, config: &StepConfig, services: Arc<ServiceRegistry>) -> Result<Box<dyn PipelineStep>> {
        Ok(Box::new(Self {
            name: name.to_string(),
            module: required_str(name, config, "module")?,
            region: required_str(name, config, "region")?,
            services,
        }))
    }
}

#[async_trait]
impl PipelineStep for RegionPromoteStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &PipelineContext) -> Result<StepResult> {
        let m = resolve_orchestrator(&self.services, &self.module, &self.name)?;
        m.promote(&self.region).await.map_err(failed(&self.name))?;
        let state = m.status().await.map_err(failed(&self.name))?;
        Ok(StepResult::from_json(json!({
            "module": self.module,
            "promoted": self.region,
            "primaryRegion": state.primary_region,
            "activeRegion": state.active_region,
        })))
    }
}

/// Refreshes health and reports the full state.
pub struct RegionStatusStep {
    name: String,
    module: String,
    services: Arc<ServiceRegistry>,
}

impl RegionStatusStep {
    pub fn factory(name: &str, config: &StepConfig, services: Arc<ServiceRegistry>) -> Result<Box<dyn PipelineStep>> {
        Ok(Box::new(Self {
            name: name.to_string(),
            module: required_str(name, config, "module")?,
            services,
        }))
    }
}

#[async_trait]
impl PipelineStep for RegionStatusStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &PipelineContext) -> Result<StepResult> {
        let m = resolve_orchestrator(&self.services, &self.module, &self.name)?;
        let healths = m.check_health().await.map_err(failed(&self.name))?;
        let state = m.status().await.map_err(failed(&self.name))?;
        Ok(StepResult::from_json(json!({
            "module": self.module,
            "regions": healths,
            "activeRegion": state.active_region,
            "primaryRegion": state.primary_region,
            "weights": state.weights,
            "status": state.status,
        })))
    }
}

/// Sets the traffic weight of a region.
pub struct RegionWeightStep {
    name: String,
    module: String,
    region: String,
    weight: i64,
    services: Arc<ServiceRegistry>,
}

impl RegionWeightStep {
    pub fn factory(name: &str, config: &StepConfig, services: Arc<ServiceRegistry>) -> Result<Box<dyn PipelineStep>> {
        Ok(Box::new(Self {
            name: name.to_string(),
            module: required_str(name, config, "module")?,
            region: required_str(name, config, "region")?,
            weight: required_int(name, config, "weight")?,
            services,
        }))
    }
}

#[async_trait]
impl PipelineStep for RegionWeightStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &PipelineContext) -> Result<StepResult> {
        let m = resolve_orchestrator(&self.services, &self.module, &self.name)?;
        m.set_weight(&self.region, self.weight)
            .await
            .map_err(failed(&self.name))?;
        Ok(StepResult::from_json(json!({
            "module": self.module,
            "region": self.region,
            "weight": self.weight,
            "weights": m.weights().await,
        })))
    }
}

/// Synchronizes routing state across all regions.
pub struct RegionSyncStep {
    name: String,
    module: String,
    services: Arc<ServiceRegistry>,
}

impl RegionSyncStep {
    pub fn factory(name: &str, config: &StepConfig, services: Arc<ServiceRegistry>) -> Result<Box<dyn PipelineStep>> {
        Ok(Box::new(Self {
            name: name.to_string(),
            module: required_str(name, config, "module")?,
            services,
        }))
    }
}

#[async_trait]
impl PipelineStep for RegionSyncStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &PipelineContext) -> Result<StepResult> {
        let m = resolve_orchestrator(&self.services, &self.module, &self.name)?;
        let report = m.sync().await.map_err(failed(&self.name))?;
        Ok(StepResult::from_json(json!({
            "module": self.module,
            "synced": true,
            "version": report.version,
            "stateHash": report.state_hash,
        })))
    }
}
