//! Region health and orchestrator state.

use crate::region::definition::RegionDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Availability status of a single region.
///
/// Shared by the orchestrator and the routing selector. A `Failed` region
/// only leaves that state through an explicit recovery action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionStatus {
    /// Serving normally
    Healthy,
    /// Serving with reduced capacity or elevated latency
    Degraded,
    /// Not serving
    Failed,
    /// Coming back after a failure
    Recovering,
}

impl RegionStatus {
    /// Whether a region in this state may receive traffic at all.
    pub fn is_routable(&self) -> bool {
        !matches!(self, RegionStatus::Failed)
    }

    /// Routing preference, lower is better. `None` for failed regions.
    pub fn routing_rank(&self) -> Option<u8> {
        match self {
            RegionStatus::Healthy => Some(0),
            RegionStatus::Degraded => Some(1),
            RegionStatus::Recovering => Some(2),
            RegionStatus::Failed => None,
        }
    }
}

impl fmt::Display for RegionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionStatus::Healthy => write!(f, "healthy"),
            RegionStatus::Degraded => write!(f, "degraded"),
            RegionStatus::Failed => write!(f, "failed"),
            RegionStatus::Recovering => write!(f, "recovering"),
        }
    }
}

/// Current health of a region.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionHealth {
    /// Region name
    pub name: String,
    /// Current status
    pub status: RegionStatus,
    /// Observed latency (ms)
    pub latency: u32,
}

impl RegionHealth {
    /// Create a healthy entry with no latency data.
    pub fn healthy(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: RegionStatus::Healthy,
            latency: 0,
        }
    }
}

/// Overall orchestrator status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrchestratorStatus {
    /// Constructed, nothing deployed yet
    Initializing,
    /// Serving from the active region
    Active,
    /// Failover in progress
    FailingOver,
    /// Active region is not healthy
    Degraded,
}

impl fmt::Display for OrchestratorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorStatus::Initializing => write!(f, "initializing"),
            OrchestratorStatus::Active => write!(f, "active"),
            OrchestratorStatus::FailingOver => write!(f, "failing-over"),
            OrchestratorStatus::Degraded => write!(f, "degraded"),
        }
    }
}

/// Snapshot of a multi-region deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorState {
    /// Health per region, in registry order
    pub regions: Vec<RegionHealth>,
    /// Region currently serving traffic
    pub active_region: String,
    /// Designated primary region
    pub primary_region: String,
    /// Traffic percentage per region
    pub weights: HashMap<String, u32>,
    /// Overall status
    pub status: OrchestratorStatus,
}

impl OrchestratorState {
    /// Build the initial state for a validated region list.
    pub fn initial(regions: &[RegionDefinition], primary: &str) -> Self {
        Self {
            regions: regions.iter().map(|r| RegionHealth::healthy(&r.name)).collect(),
            active_region: primary.to_string(),
            primary_region: primary.to_string(),
            weights: initial_weights(regions, primary),
            status: OrchestratorStatus::Initializing,
        }
    }

    /// Health entry for a region.
    pub fn health(&self, name: &str) -> Option<&RegionHealth> {
        self.regions.iter().find(|h| h.name == name)
    }

    /// Mutable health entry for a region.
    pub fn health_mut(&mut self, name: &str) -> Option<&mut RegionHealth> {
        self.regions.iter_mut().find(|h| h.name == name)
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> u32 {
        self.weights.values().sum()
    }
}

/// Split 100% evenly across regions; `anchor` absorbs the division remainder.
pub fn initial_weights(regions: &[RegionDefinition], anchor: &str) -> HashMap<String, u32> {
    let mut weights = HashMap::with_capacity(regions.len());
    if regions.is_empty() {
        return weights;
    }

    let count = regions.len() as u32;
    let share = 100 / count;
    for region in regions {
        weights.insert(region.name.clone(), share);
    }
    if let Some(w) = weights.get_mut(anchor) {
        *w += 100 - share * count;
    }
    weights
}
