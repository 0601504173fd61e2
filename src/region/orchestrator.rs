//! Deployment orchestrator.
//!
//! Owns the region registry, the lock-guarded [`OrchestratorState`] and a
//! provider backend. Every public operation is all-or-nothing: a failed call
//! leaves the state exactly as it was.

use crate::backend::{create_backend_for_provider, BackendType, RegionBackend};
use crate::core::{now, Error, Result};
use crate::region::definition::{validate_region_names, RegionDefinition};
use crate::region::failover::{FailoverEvent, FailoverHistory};
use crate::region::state::{OrchestratorState, OrchestratorStatus, RegionHealth, RegionStatus};
use crate::region::sync::SyncReport;
use crate::registry::ServiceRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Orchestrator configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Backend provider (`mock` when empty)
    #[serde(default)]
    pub provider: String,
    /// Region definitions, in registry order
    #[serde(default)]
    pub regions: Vec<RegionDefinition>,
}

impl OrchestratorConfig {
    /// Config using the mock backend.
    pub fn mock(regions: Vec<RegionDefinition>) -> Self {
        Self {
            provider: "mock".to_string(),
            regions,
        }
    }

    /// Parse from a loosely-typed config map.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::Configuration(e.to_string()))
    }
}

/// Multi-region deployment orchestrator.
pub struct Orchestrator {
    name: String,
    regions: Vec<RegionDefinition>,
    state: RwLock<OrchestratorState>,
    backend: Arc<dyn RegionBackend>,
    history: parking_lot::Mutex<FailoverHistory>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("name", &self.name)
            .field("regions", &self.regions.len())
            .field("backend", &self.backend.backend_type())
            .finish()
    }
}

impl Orchestrator {
    /// Create an orchestrator, selecting the backend from `config.provider`.
    pub fn new(name: &str, config: OrchestratorConfig) -> Result<Self> {
        let primary = validate_regions(name, &config.regions)?;
        let backend = create_backend_for_provider(&config.provider).map_err(|e| match e {
            Error::UnsupportedProvider { provider, .. } => Error::UnsupportedProvider {
                provider,
                module: Some(name.to_string()),
            },
            other => other,
        })?;
        Ok(Self::build(name, config.regions, primary, backend))
    }

    /// Create an orchestrator around an existing backend.
    pub fn with_backend(
        name: &str,
        regions: Vec<RegionDefinition>,
        backend: Arc<dyn RegionBackend>,
    ) -> Result<Self> {
        let primary = validate_regions(name, &regions)?;
        Ok(Self::build(name, regions, primary, backend))
    }

    /// Create an orchestrator and register it under `name`.
    pub fn init(name: &str, config: OrchestratorConfig, registry: &ServiceRegistry) -> Result<Arc<Self>> {
        let orchestrator = Arc::new(Self::new(name, config)?);
        registry.register(name, &format!("MultiRegion: {}", name), Arc::clone(&orchestrator))?;
        Ok(orchestrator)
    }

    fn build(
        name: &str,
        regions: Vec<RegionDefinition>,
        primary: String,
        backend: Arc<dyn RegionBackend>,
    ) -> Self {
        let state = OrchestratorState::initial(&regions, &primary);
        tracing::info!(
            module = name,
            regions = regions.len(),
            primary = %primary,
            backend = %backend.backend_type(),
            "orchestrator initialized"
        );
        Self {
            name: name.to_string(),
            regions,
            state: RwLock::new(state),
            backend,
            history: parking_lot::Mutex::new(FailoverHistory::default()),
        }
    }

    /// Module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Region registry, in configuration order.
    pub fn regions(&self) -> &[RegionDefinition] {
        &self.regions
    }

    /// Backend in use.
    pub fn backend_type(&self) -> BackendType {
        self.backend.backend_type()
    }

    /// Look up a region definition.
    pub fn region(&self, name: &str) -> Result<&RegionDefinition> {
        self.regions
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::UnknownRegion(name.to_string()))
    }

    /// Shortest health-check interval configured on any region.
    pub fn health_check_interval(&self) -> Option<Duration> {
        self.regions.iter().filter_map(|r| r.health_check.interval()).min()
    }

    fn context(&self, operation: &'static str, region: Option<&str>) -> impl FnOnce(Error) -> Error {
        let module = self.name.clone();
        let region = region.map(str::to_string);
        move |source| Error::Operation {
            module,
            operation,
            region,
            source: Box::new(source),
        }
    }

    /// Deploy to a region, marking it healthy.
    pub async fn deploy(&self, region: &str) -> Result<()> {
        let definition = self.region(region)?;
        let outcome = self
            .backend
            .deploy(definition)
            .await
            .map_err(self.context("deploy", Some(region)))?;

        let mut state = self.state.write().await;
        if let Some(h) = state.health_mut(region) {
            h.status = RegionStatus::Healthy;
            h.latency = outcome.latency;
        }
        state.status = OrchestratorStatus::Active;
        tracing::info!(module = %self.name, region, latency = outcome.latency, "region deployed");
        Ok(())
    }

    /// Current state snapshot, independent of later mutations.
    pub async fn status(&self) -> Result<OrchestratorState> {
        let snapshot = self.state.read().await.clone();
        self.backend
            .status(snapshot)
            .await
            .map_err(self.context("status", None))
    }

    /// Fail traffic over from one region to another.
    ///
    /// The state lock is held for the whole sequence so readers never see a
    /// half-applied failover.
    pub async fn failover(&self, from: &str, to: &str) -> Result<()> {
        let from_def = self.region(from)?;
        let to_def = self.region(to)?;
        if from == to {
            return Err(Error::InvalidFailover(format!(
                "source and target are both {:?}",
                from
            )));
        }

        let started_at = now();
        let mut state = self.state.write().await;
        tracing::warn!(module = %self.name, from, to, "starting failover");

        self.backend
            .failover(from_def, to_def)
            .await
            .map_err(self.context("failover", Some(to)))?;

        // source -> failed, target -> recovering -> healthy
        if let Some(h) = state.health_mut(from) {
            h.status = RegionStatus::Failed;
        }
        if let Some(h) = state.health_mut(to) {
            h.status = RegionStatus::Recovering;
        }
        state.status = OrchestratorStatus::FailingOver;
        state.active_region = to.to_string();

        if let Some(h) = state.health_mut(to) {
            h.status = RegionStatus::Healthy;
        }
        state.status = OrchestratorStatus::Active;
        drop(state);

        let event = FailoverEvent::completed(from, to, started_at);
        tracing::info!(
            module = %self.name,
            from,
            to,
            duration_ms = event.duration_ms,
            "failover complete"
        );
        self.history.lock().record(event);
        Ok(())
    }

    /// Make a region both primary and active. Health is not touched.
    pub async fn promote(&self, region: &str) -> Result<()> {
        let definition = self.region(region)?;
        self.backend
            .promote(definition)
            .await
            .map_err(self.context("promote", Some(region)))?;

        let mut state = self.state.write().await;
        state.primary_region = region.to_string();
        state.active_region = region.to_string();
        tracing::info!(module = %self.name, region, "region promoted");
        Ok(())
    }

    /// Set the traffic weight for a region.
    ///
    /// Other regions are not rebalanced; the operator owns keeping the total
    /// at 100.
    pub async fn set_weight(&self, region: &str, weight: i64) -> Result<()> {
        let definition = self.region(region)?;
        let weight = u32::try_from(weight)
            .ok()
            .filter(|w| *w <= 100)
            .ok_or_else(|| Error::WeightOutOfRange {
                region: region.to_string(),
                weight,
            })?;

        self.backend
            .set_weight(definition, weight)
            .await
            .map_err(self.context("set_weight", Some(region)))?;

        let mut state = self.state.write().await;
        state.weights.insert(region.to_string(), weight);
        let total = state.total_weight();
        drop(state);

        if total != 100 {
            tracing::debug!(module = %self.name, region, weight, total, "weights no longer sum to 100");
        }
        Ok(())
    }

    /// Reconcile routing state across all regions.
    pub async fn sync(&self) -> Result<SyncReport> {
        let snapshot = self.state.read().await.clone();
        let report = self
            .backend
            .sync(&self.regions, &snapshot)
            .await
            .map_err(self.context("sync", None))?;
        tracing::info!(module = %self.name, version = report.version, hash = %report.state_hash, "regions synced");
        Ok(report)
    }

    /// Refresh health for every region.
    ///
    /// A failed region is never healed here; only deploy or failover can
    /// bring it back.
    pub async fn check_health(&self) -> Result<Vec<RegionHealth>> {
        let snapshot = self.state.read().await.regions.clone();
        let refreshed = self
            .backend
            .check_health(&self.regions, &snapshot)
            .await
            .map_err(self.context("check_health", None))?;

        let observed: HashMap<&str, &RegionHealth> =
            refreshed.iter().map(|h| (h.name.as_str(), h)).collect();
        let was_failed: HashSet<&str> = snapshot
            .iter()
            .filter(|h| h.status == RegionStatus::Failed)
            .map(|h| h.name.as_str())
            .collect();

        let mut state = self.state.write().await;
        for health in state.regions.iter_mut() {
            if health.status == RegionStatus::Failed || was_failed.contains(health.name.as_str()) {
                continue;
            }
            if let Some(update) = observed.get(health.name.as_str()) {
                health.status = update.status;
                health.latency = update.latency;
            }
        }

        let active_failed = state
            .health(&state.active_region)
            .map(|h| h.status == RegionStatus::Failed)
            .unwrap_or(false);
        match (state.status, active_failed) {
            (OrchestratorStatus::Active, true) => {
                tracing::warn!(module = %self.name, region = %state.active_region, "active region failed");
                state.status = OrchestratorStatus::Degraded;
            }
            (OrchestratorStatus::Degraded, false) => state.status = OrchestratorStatus::Active,
            _ => {}
        }

        tracing::debug!(module = %self.name, "health refreshed");
        Ok(state.regions.clone())
    }

    /// Current traffic weights.
    pub async fn weights(&self) -> HashMap<String, u32> {
        self.state.read().await.weights.clone()
    }

    /// Completed failovers, oldest first.
    pub fn failover_history(&self) -> Vec<FailoverEvent> {
        self.history.lock().events()
    }
}

/// Check a region list and return the primary's name.
fn validate_regions(module: &str, regions: &[RegionDefinition]) -> Result<String> {
    if regions.is_empty() {
        return Err(Error::Configuration(format!(
            "platform.region {:?}: at least one region is required",
            module
        )));
    }

    validate_region_names(&format!("platform.region {:?}", module), regions)?;

    let primaries: Vec<&str> = regions
        .iter()
        .filter(|r| r.is_primary())
        .map(|r| r.name.as_str())
        .collect();
    match primaries.as_slice() {
        [primary] => Ok(primary.to_string()),
        [] => Err(Error::Configuration(format!(
            "platform.region {:?}: no primary region configured (set priority=primary on one region)",
            module
        ))),
        many => Err(Error::Configuration(format!(
            "platform.region {:?}: multiple primary regions configured: {}",
            module,
            many.join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DeployOutcome, MockBackend};
    use crate::region::definition::{HealthCheckConfig, Priority};
    use async_trait::async_trait;
    use serde_json::json;

    fn test_config() -> Value {
        json!({
            "provider": "mock",
            "regions": [
                {
                    "name": "us-east-1",
                    "provider": "aws",
                    "endpoint": "https://us-east-1.example.com",
                    "priority": "primary",
                    "health_check": {"interval": 30.0, "timeout": 5.0, "path": "/health", "threshold": 3.0}
                },
                {
                    "name": "us-west-2",
                    "provider": "aws",
                    "endpoint": "https://us-west-2.example.com",
                    "priority": "secondary",
                    "health_check": {"interval": 30.0, "timeout": 5.0, "path": "/health", "threshold": 3.0}
                },
                {
                    "name": "eu-west-1",
                    "provider": "aws",
                    "endpoint": "https://eu-west-1.example.com",
                    "priority": "dr",
                    "health_check": {"interval": 60.0, "timeout": 10.0, "path": "/health", "threshold": 5.0}
                }
            ]
        })
    }

    fn setup() -> Orchestrator {
        let config = OrchestratorConfig::from_value(test_config()).unwrap();
        Orchestrator::new("prod-regions", config).unwrap()
    }

    /// Backend whose every call fails.
    struct UnavailableBackend;

    fn unavailable(operation: &str) -> Error {
        Error::BackendUnavailable {
            operation: operation.to_string(),
            region: None,
            message: "provider API unreachable".to_string(),
        }
    }

    #[async_trait]
    impl RegionBackend for UnavailableBackend {
        fn backend_type(&self) -> BackendType {
            BackendType::Aws
        }
        async fn deploy(&self, _: &RegionDefinition) -> Result<DeployOutcome> {
            Err(unavailable("deploy"))
        }
        async fn failover(&self, _: &RegionDefinition, _: &RegionDefinition) -> Result<()> {
            Err(unavailable("failover"))
        }
        async fn promote(&self, _: &RegionDefinition) -> Result<()> {
            Err(unavailable("promote"))
        }
        async fn set_weight(&self, _: &RegionDefinition, _: u32) -> Result<()> {
            Err(unavailable("set_weight"))
        }
        async fn sync(&self, _: &[RegionDefinition], _: &OrchestratorState) -> Result<SyncReport> {
            Err(unavailable("sync"))
        }
        async fn check_health(&self, _: &[RegionDefinition], _: &[RegionHealth]) -> Result<Vec<RegionHealth>> {
            Err(unavailable("check_health"))
        }
    }

    fn health(state: &OrchestratorState, name: &str) -> RegionStatus {
        state.health(name).unwrap().status
    }

    #[test]
    fn test_new_requires_regions() {
        let err = Orchestrator::new("empty", OrchestratorConfig::mock(vec![])).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_new_requires_primary() {
        let config = OrchestratorConfig::from_value(json!({
            "provider": "mock",
            "regions": [{"name": "us-east-1", "priority": "secondary"}]
        }))
        .unwrap();
        let err = Orchestrator::new("no-primary", config).unwrap_err();
        assert!(err.to_string().contains("no primary region"));
    }

    #[test]
    fn test_new_rejects_multiple_primaries() {
        let config = OrchestratorConfig::mock(vec![
            RegionDefinition::new("a", Priority::Primary),
            RegionDefinition::new("b", Priority::Primary),
        ]);
        assert!(Orchestrator::new("two", config).unwrap_err().is_configuration());
    }

    #[test]
    fn test_new_rejects_duplicate_names() {
        let config = OrchestratorConfig::mock(vec![
            RegionDefinition::new("a", Priority::Primary),
            RegionDefinition::new("a", Priority::Secondary),
        ]);
        assert!(Orchestrator::new("dup", config).unwrap_err().is_configuration());
    }

    #[test]
    fn test_new_rejects_unsupported_provider() {
        let mut value = test_config();
        value["provider"] = json!("unknown-cloud");
        let config = OrchestratorConfig::from_value(value).unwrap();
        let err = Orchestrator::new("bad", config).unwrap_err();
        assert!(matches!(
            &err,
            Error::UnsupportedProvider { provider, module: Some(m) } if provider == "unknown-cloud" && m == "bad"
        ));
        assert_eq!(
            err.to_string(),
            r#"platform.region "bad": unsupported provider "unknown-cloud""#
        );
    }

    #[test]
    fn test_init_registers_service() {
        let registry = ServiceRegistry::new();
        let config = OrchestratorConfig::from_value(test_config()).unwrap();
        let orchestrator = Orchestrator::init("prod-regions", config, &registry).unwrap();
        assert_eq!(orchestrator.name(), "prod-regions");

        let resolved = registry.resolve::<Orchestrator>("prod-regions").unwrap();
        assert!(Arc::ptr_eq(&orchestrator, &resolved));
    }

    #[test]
    fn test_health_check_interval() {
        let orchestrator = setup();
        assert_eq!(orchestrator.health_check_interval(), Some(Duration::from_secs(30)));

        let quiet = Orchestrator::new(
            "quiet",
            OrchestratorConfig::mock(vec![RegionDefinition::new("a", Priority::Primary)
                .with_health_check(HealthCheckConfig { interval: 0, ..Default::default() })]),
        )
        .unwrap();
        assert_eq!(quiet.health_check_interval(), None);
    }

    #[tokio::test]
    async fn test_initial_weights() {
        let orchestrator = setup();
        let weights = orchestrator.weights().await;
        assert_eq!(weights.len(), 3);
        assert_eq!(weights.values().sum::<u32>(), 100);
        assert_eq!(weights["us-east-1"], 34);
    }

    #[tokio::test]
    async fn test_deploy_activates() {
        let orchestrator = setup();
        assert_eq!(
            orchestrator.status().await.unwrap().status,
            OrchestratorStatus::Initializing
        );

        orchestrator.deploy("us-east-1").await.unwrap();
        orchestrator.deploy("us-west-2").await.unwrap();

        let state = orchestrator.status().await.unwrap();
        assert_eq!(state.status, OrchestratorStatus::Active);
        assert_eq!(state.health("us-east-1").unwrap().latency, 10);
    }

    #[tokio::test]
    async fn test_deploy_is_idempotent() {
        let orchestrator = setup();
        orchestrator.deploy("us-east-1").await.unwrap();
        let first = orchestrator.status().await.unwrap();
        orchestrator.deploy("us-east-1").await.unwrap();
        assert_eq!(orchestrator.status().await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_deploy_unknown_region() {
        let orchestrator = setup();
        let before = orchestrator.status().await.unwrap();
        let err = orchestrator.deploy("ap-southeast-1").await.unwrap_err();
        assert!(matches!(err, Error::UnknownRegion(r) if r == "ap-southeast-1"));
        assert_eq!(orchestrator.status().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_deploy_heals_failed_region() {
        let orchestrator = setup();
        orchestrator.failover("us-east-1", "us-west-2").await.unwrap();
        orchestrator.deploy("us-east-1").await.unwrap();
        let state = orchestrator.status().await.unwrap();
        assert_eq!(health(&state, "us-east-1"), RegionStatus::Healthy);
    }

    #[tokio::test]
    async fn test_status_is_a_snapshot() {
        let orchestrator = setup();
        let before = orchestrator.status().await.unwrap();
        orchestrator.promote("eu-west-1").await.unwrap();
        assert_eq!(before.primary_region, "us-east-1");
    }

    #[tokio::test]
    async fn test_failover_lifecycle() {
        let orchestrator = setup();
        orchestrator.deploy("us-east-1").await.unwrap();
        orchestrator.deploy("us-west-2").await.unwrap();

        orchestrator.failover("us-east-1", "us-west-2").await.unwrap();

        let state = orchestrator.status().await.unwrap();
        assert_eq!(state.active_region, "us-west-2");
        assert_eq!(state.status, OrchestratorStatus::Active);
        assert_eq!(health(&state, "us-east-1"), RegionStatus::Failed);
        assert_eq!(health(&state, "us-west-2"), RegionStatus::Healthy);
        // primary designation is unchanged by failover
        assert_eq!(state.primary_region, "us-east-1");

        let history = orchestrator.failover_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].from, "us-east-1");
        assert_eq!(history[0].to, "us-west-2");
    }

    #[tokio::test]
    async fn test_failover_unknown_region() {
        let orchestrator = setup();
        let before = orchestrator.status().await.unwrap();

        assert!(matches!(
            orchestrator.failover("nonexistent", "us-west-2").await,
            Err(Error::UnknownRegion(_))
        ));
        assert!(matches!(
            orchestrator.failover("us-east-1", "nonexistent").await,
            Err(Error::UnknownRegion(_))
        ));
        assert_eq!(orchestrator.status().await.unwrap(), before);
        assert!(orchestrator.failover_history().is_empty());
    }

    #[tokio::test]
    async fn test_failover_to_self_rejected() {
        let orchestrator = setup();
        assert!(matches!(
            orchestrator.failover("us-east-1", "us-east-1").await,
            Err(Error::InvalidFailover(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_readers_never_see_partial_failover() {
        let orchestrator = Arc::new(setup());
        orchestrator.deploy("us-east-1").await.unwrap();
        orchestrator.deploy("us-west-2").await.unwrap();

        let reader = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move {
                for _ in 0..200 {
                    let state = orchestrator.status().await.unwrap();
                    assert!(matches!(
                        state.status,
                        OrchestratorStatus::Active | OrchestratorStatus::Initializing
                    ));
                    let east = health(&state, "us-east-1");
                    let west = health(&state, "us-west-2");
                    assert!(
                        east == RegionStatus::Healthy || west == RegionStatus::Healthy,
                        "neither region healthy in snapshot"
                    );
                    tokio::task::yield_now().await;
                }
            })
        };

        for _ in 0..50 {
            orchestrator.failover("us-east-1", "us-west-2").await.unwrap();
            orchestrator.failover("us-west-2", "us-east-1").await.unwrap();
        }
        reader.await.unwrap();
    }

    #[tokio::test]
    async fn test_promote() {
        let orchestrator = setup();
        orchestrator.deploy("us-east-1").await.unwrap();
        let before = orchestrator.status().await.unwrap();

        orchestrator.promote("us-west-2").await.unwrap();

        let state = orchestrator.status().await.unwrap();
        assert_eq!(state.primary_region, "us-west-2");
        assert_eq!(state.active_region, "us-west-2");
        assert_eq!(state.regions, before.regions);
    }

    #[tokio::test]
    async fn test_promote_unknown_region() {
        let orchestrator = setup();
        assert!(matches!(
            orchestrator.promote("nowhere").await,
            Err(Error::UnknownRegion(_))
        ));
    }

    #[tokio::test]
    async fn test_set_weight() {
        let orchestrator = setup();
        orchestrator.set_weight("us-east-1", 80).await.unwrap();
        orchestrator.set_weight("us-west-2", 20).await.unwrap();

        let weights = orchestrator.weights().await;
        assert_eq!(weights["us-east-1"], 80);
        assert_eq!(weights["us-west-2"], 20);
    }

    #[tokio::test]
    async fn test_set_weight_bounds_inclusive() {
        let orchestrator = setup();
        orchestrator.set_weight("eu-west-1", 0).await.unwrap();
        orchestrator.set_weight("us-west-2", 100).await.unwrap();
        let weights = orchestrator.weights().await;
        assert_eq!(weights["eu-west-1"], 0);
        assert_eq!(weights["us-west-2"], 100);
    }

    #[tokio::test]
    async fn test_set_weight_out_of_range() {
        let orchestrator = setup();
        let before = orchestrator.weights().await;

        for weight in [150, -1, 101] {
            let err = orchestrator.set_weight("us-east-1", weight).await.unwrap_err();
            assert!(matches!(err, Error::WeightOutOfRange { weight: w, .. } if w == weight));
        }
        assert_eq!(orchestrator.weights().await, before);
    }

    #[tokio::test]
    async fn test_set_weight_unknown_region() {
        let orchestrator = setup();
        assert!(matches!(
            orchestrator.set_weight("nowhere", 10).await,
            Err(Error::UnknownRegion(_))
        ));
    }

    #[tokio::test]
    async fn test_set_weight_does_not_renormalize() {
        // Weights are trusted operator input; the total may drift from 100.
        let orchestrator = setup();
        orchestrator.set_weight("us-east-1", 90).await.unwrap();
        let weights = orchestrator.weights().await;
        assert_eq!(weights["us-west-2"], 33);
        assert_eq!(weights["eu-west-1"], 33);
        assert_eq!(weights.values().sum::<u32>(), 156);
    }

    #[tokio::test]
    async fn test_sync() {
        let orchestrator = setup();
        let first = orchestrator.sync().await.unwrap();
        assert_eq!(first.regions, 3);

        orchestrator.set_weight("us-east-1", 50).await.unwrap();
        let second = orchestrator.sync().await.unwrap();
        assert!(second.version > first.version);
        assert_ne!(first.state_hash, second.state_hash);
    }

    #[tokio::test]
    async fn test_check_health() {
        let orchestrator = setup();
        let healths = orchestrator.check_health().await.unwrap();
        assert_eq!(healths.len(), 3);
        assert!(healths.iter().all(|h| h.status == RegionStatus::Healthy));
        let latencies: Vec<u32> = healths.iter().map(|h| h.latency).collect();
        assert_eq!(latencies, vec![5, 8, 11]);
    }

    #[tokio::test]
    async fn test_check_health_never_heals_failed() {
        let orchestrator = setup();
        orchestrator.deploy("us-east-1").await.unwrap();
        orchestrator.failover("us-east-1", "us-west-2").await.unwrap();
        let before = orchestrator.status().await.unwrap();

        let healths = orchestrator.check_health().await.unwrap();
        let east = healths.iter().find(|h| h.name == "us-east-1").unwrap();
        assert_eq!(east.status, RegionStatus::Failed);
        assert_eq!(east.latency, before.health("us-east-1").unwrap().latency);
        assert!(healths
            .iter()
            .filter(|h| h.name != "us-east-1")
            .all(|h| h.status == RegionStatus::Healthy));
    }

    #[tokio::test]
    async fn test_check_health_degrades_when_active_failed() {
        let orchestrator = setup();
        orchestrator.deploy("us-east-1").await.unwrap();
        orchestrator.failover("us-east-1", "us-west-2").await.unwrap();
        // routing precedence moves back to the failed region
        orchestrator.promote("us-east-1").await.unwrap();

        orchestrator.check_health().await.unwrap();
        assert_eq!(
            orchestrator.status().await.unwrap().status,
            OrchestratorStatus::Degraded
        );

        orchestrator.deploy("us-east-1").await.unwrap();
        assert_eq!(
            orchestrator.status().await.unwrap().status,
            OrchestratorStatus::Active
        );
    }

    #[tokio::test]
    async fn test_backend_errors_leave_state_unchanged() {
        let orchestrator = Orchestrator::with_backend(
            "flaky",
            vec![
                RegionDefinition::new("us-east-1", Priority::Primary),
                RegionDefinition::new("us-west-2", Priority::Secondary),
            ],
            Arc::new(UnavailableBackend),
        )
        .unwrap();
        let before = orchestrator.state.read().await.clone();

        assert!(orchestrator.deploy("us-east-1").await.is_err());
        assert!(orchestrator.failover("us-east-1", "us-west-2").await.is_err());
        assert!(orchestrator.promote("us-west-2").await.is_err());
        assert!(orchestrator.set_weight("us-west-2", 10).await.is_err());
        assert!(orchestrator.sync().await.is_err());
        assert!(orchestrator.check_health().await.is_err());

        assert_eq!(*orchestrator.state.read().await, before);
        assert!(orchestrator.failover_history().is_empty());
    }

    #[tokio::test]
    async fn test_backend_error_carries_context() {
        let orchestrator = Orchestrator::with_backend(
            "flaky",
            vec![RegionDefinition::new("us-east-1", Priority::Primary)],
            Arc::new(UnavailableBackend),
        )
        .unwrap();

        let err = orchestrator.deploy("us-east-1").await.unwrap_err();
        match &err {
            Error::Operation {
                module,
                operation,
                region,
                ..
            } => {
                assert_eq!(module, "flaky");
                assert_eq!(*operation, "deploy");
                assert_eq!(region.as_deref(), Some("us-east-1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(err.root_cause(), Error::BackendUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_with_backend_uses_given_backend() {
        let orchestrator = Orchestrator::with_backend(
            "custom",
            vec![RegionDefinition::new("a", Priority::Primary)],
            Arc::new(MockBackend::new()),
        )
        .unwrap();
        assert_eq!(orchestrator.backend_type(), BackendType::Mock);
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let orchestrator = setup();
        orchestrator.deploy("us-east-1").await.unwrap();
        orchestrator.deploy("us-west-2").await.unwrap();
        assert_eq!(
            orchestrator.status().await.unwrap().status,
            OrchestratorStatus::Active
        );

        orchestrator.failover("us-east-1", "us-west-2").await.unwrap();
        let state = orchestrator.status().await.unwrap();
        assert_eq!(state.active_region, "us-west-2");

        let value = serde_json::to_value(&state).unwrap();
        let east = value["regions"]
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["name"] == "us-east-1")
            .unwrap();
        assert_eq!(east["status"], "failed");
    }
}
