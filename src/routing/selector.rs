//! Region selection for individual requests.
//!
//! The selector keeps its own copy of the region definitions and a status per
//! region. It shares the orchestrator's status vocabulary but not its state;
//! callers that co-locate both feed orchestrator health in through
//! [`RoutingSelector::apply_health`].

use crate::core::{Error, Result};
use crate::region::definition::{validate_region_names, RegionDefinition};
use crate::region::state::{initial_weights, RegionHealth, RegionStatus};
use crate::registry::ServiceRegistry;
use crate::routing::mode::{RoutingConfig, RoutingCounters, RoutingMetrics, RoutingMode};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct RouterState {
    regions: Vec<RegionDefinition>,
    statuses: HashMap<String, RegionStatus>,
    latencies: HashMap<String, u32>,
    weights: HashMap<String, u32>,
}

impl RouterState {
    fn new(regions: Vec<RegionDefinition>) -> Self {
        let statuses = regions
            .iter()
            .map(|r| (r.name.clone(), RegionStatus::Healthy))
            .collect();
        let anchor = regions
            .iter()
            .find(|r| r.is_primary())
            .or_else(|| regions.first())
            .map(|r| r.name.clone())
            .unwrap_or_default();
        let weights = initial_weights(&regions, &anchor);
        Self {
            regions,
            statuses,
            latencies: HashMap::new(),
            weights,
        }
    }

    fn status_mut(&mut self, region: &str) -> Result<&mut RegionStatus> {
        self.statuses
            .get_mut(region)
            .ok_or_else(|| Error::UnknownRegion(region.to_string()))
    }
}

fn owner(name: &str) -> String {
    format!("platform.region_router {:?}", name)
}

/// Pick the region that should serve the next request.
///
/// Failed regions are never chosen. Among the rest, healthy beats degraded
/// beats recovering; ties are then broken by mode and finally by registry
/// order.
pub fn select_region<'a>(
    mode: RoutingMode,
    regions: &'a [RegionDefinition],
    statuses: &HashMap<String, RegionStatus>,
    latencies: &HashMap<String, u32>,
) -> Option<&'a RegionDefinition> {
    let candidates = regions.iter().enumerate().filter_map(|(index, region)| {
        let rank = statuses.get(&region.name)?.routing_rank()?;
        Some((index, rank, region))
    });

    match mode {
        RoutingMode::Geo => candidates
            .min_by_key(|(index, rank, region)| (*rank, region.priority, *index))
            .map(|(_, _, region)| region),
        RoutingMode::Latency => candidates
            .min_by_key(|(index, rank, region)| {
                let latency = latencies.get(&region.name).copied().unwrap_or(u32::MAX);
                (*rank, latency, *index)
            })
            .map(|(_, _, region)| region),
    }
}

/// Request router across regions.
pub struct RoutingSelector {
    name: String,
    mode: RoutingMode,
    state: RwLock<RouterState>,
    counters: RoutingCounters,
}

impl std::fmt::Debug for RoutingSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingSelector")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .finish()
    }
}

impl RoutingSelector {
    /// Create a new selector. Region names must be non-empty and unique.
    pub fn new(name: &str, config: RoutingConfig) -> Result<Self> {
        validate_region_names(&owner(name), &config.regions)?;
        Ok(Self {
            name: name.to_string(),
            mode: config.mode,
            state: RwLock::new(RouterState::new(config.regions)),
            counters: RoutingCounters::default(),
        })
    }

    /// Create a selector and register it under `name`.
    pub fn init(name: &str, config: RoutingConfig, registry: &ServiceRegistry) -> Result<Arc<Self>> {
        let selector = Arc::new(Self::new(name, config)?);
        registry.register(name, &format!("RegionRouter: {}", name), Arc::clone(&selector))?;
        Ok(selector)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> RoutingMode {
        self.mode
    }

    /// Replace the region set. Every region starts healthy with no latency data.
    ///
    /// An invalid list leaves the current regions in place.
    pub async fn set_regions(&self, regions: Vec<RegionDefinition>) -> Result<()> {
        validate_region_names(&owner(&self.name), &regions)?;
        let mut state = self.state.write().await;
        *state = RouterState::new(regions);
        tracing::debug!(router = %self.name, regions = state.regions.len(), "regions replaced");
        Ok(())
    }

    /// Current region definitions.
    pub async fn regions(&self) -> Vec<RegionDefinition> {
        self.state.read().await.regions.clone()
    }

    /// Select the region for a single request.
    ///
    /// Never blocks; cancel by dropping the future.
    pub async fn route_request(&self) -> Result<RegionDefinition> {
        let state = self.state.read().await;
        let chosen = select_region(self.mode, &state.regions, &state.statuses, &state.latencies).cloned();
        drop(state);

        self.counters.record(chosen.is_some());
        match chosen {
            Some(region) => {
                tracing::debug!(router = %self.name, mode = %self.mode, region = %region.name, "request routed");
                Ok(region)
            }
            None => {
                tracing::warn!(router = %self.name, "no healthy region available");
                Err(Error::NoHealthyRegion)
            }
        }
    }

    /// Mark `from` failed and bring `to` back to healthy.
    pub async fn failover(&self, from: &str, to: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.statuses.contains_key(from) {
            return Err(Error::UnknownRegion(from.to_string()));
        }
        if !state.statuses.contains_key(to) {
            return Err(Error::UnknownRegion(to.to_string()));
        }
        if from == to {
            return Err(Error::InvalidFailover(format!(
                "source and target are both {:?}",
                from
            )));
        }

        *state.status_mut(from)? = RegionStatus::Failed;
        *state.status_mut(to)? = RegionStatus::Recovering;
        *state.status_mut(to)? = RegionStatus::Healthy;
        tracing::warn!(router = %self.name, from, to, "routing failover");
        Ok(())
    }

    /// Force a region into a state.
    pub async fn set_state(&self, region: &str, status: RegionStatus) -> Result<()> {
        let mut state = self.state.write().await;
        *state.status_mut(region)? = status;
        tracing::debug!(router = %self.name, region, %status, "state overridden");
        Ok(())
    }

    /// Current state of a region.
    pub async fn state(&self, region: &str) -> Result<RegionStatus> {
        self.state
            .read()
            .await
            .statuses
            .get(region)
            .copied()
            .ok_or_else(|| Error::UnknownRegion(region.to_string()))
    }

    /// Advisory traffic weights derived from the region definitions.
    pub async fn weights(&self) -> HashMap<String, u32> {
        self.state.read().await.weights.clone()
    }

    /// Record an observed latency for latency-mode routing.
    pub async fn record_latency(&self, region: &str, latency_ms: u32) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.statuses.contains_key(region) {
            return Err(Error::UnknownRegion(region.to_string()));
        }
        state.latencies.insert(region.to_string(), latency_ms);
        Ok(())
    }

    /// Feed health observations (e.g. from an orchestrator) into the selector.
    ///
    /// Unknown regions are ignored. Like health checks, this never heals a
    /// region that is already failed.
    pub async fn apply_health(&self, healths: &[RegionHealth]) {
        let mut state = self.state.write().await;
        for health in healths {
            let Some(current) = state.statuses.get(&health.name).copied() else {
                continue;
            };
            if current != RegionStatus::Failed {
                state.statuses.insert(health.name.clone(), health.status);
            }
            state.latencies.insert(health.name.clone(), health.latency);
        }
    }

    /// Routing counters.
    pub fn metrics(&self) -> RoutingMetrics {
        self.counters.snapshot()
    }
}
