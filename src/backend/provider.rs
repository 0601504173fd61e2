//! RegionBackend trait definition.
//!
//! Core trait that all provider backends must implement.

use crate::core::{Error, Result};
use crate::region::definition::RegionDefinition;
use crate::region::state::{OrchestratorState, RegionHealth};
use crate::region::sync::SyncReport;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backend type identifier, selected by the `provider` config key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// In-memory simulation
    Mock,
    /// AWS (EKS/ECS, Route53)
    Aws,
    /// Google Cloud
    Gcp,
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendType::Mock => write!(f, "mock"),
            BackendType::Aws => write!(f, "aws"),
            BackendType::Gcp => write!(f, "gcp"),
        }
    }
}

impl FromStr for BackendType {
    type Err = Error;

    /// An empty provider selects the mock backend.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "mock" => Ok(BackendType::Mock),
            "aws" => Ok(BackendType::Aws),
            "gcp" => Ok(BackendType::Gcp),
            other => Err(Error::UnsupportedProvider {
                provider: other.to_string(),
                module: None,
            }),
        }
    }
}

/// Result of deploying to a region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployOutcome {
    /// Latency reported by the freshly deployed region (ms)
    pub latency: u32,
}

/// Core trait for provider backends.
///
/// The orchestrator validates region names and owns all state; backends only
/// perform the provider-side effect and report what they observed. Calls
/// other than `failover` are made outside the orchestrator's state lock.
#[async_trait]
pub trait RegionBackend: Send + Sync {
    /// Get the backend type.
    fn backend_type(&self) -> BackendType;

    /// Roll out the deployment to a region.
    async fn deploy(&self, region: &RegionDefinition) -> Result<DeployOutcome>;

    /// Enrich a state snapshot with provider-side information.
    async fn status(&self, snapshot: OrchestratorState) -> Result<OrchestratorState> {
        Ok(snapshot)
    }

    /// Shift traffic away from `from` and bring `to` into service.
    ///
    /// Returns once the target is confirmed healthy.
    async fn failover(&self, from: &RegionDefinition, to: &RegionDefinition) -> Result<()>;

    /// Make a region the routing primary.
    async fn promote(&self, region: &RegionDefinition) -> Result<()>;

    /// Apply a traffic weight for a region.
    async fn set_weight(&self, region: &RegionDefinition, weight: u32) -> Result<()>;

    /// Replicate routing state to every region.
    async fn sync(&self, regions: &[RegionDefinition], snapshot: &OrchestratorState) -> Result<SyncReport>;

    /// Refresh health for every region.
    ///
    /// `current` is in registry order; the result must be too. Regions
    /// currently `Failed` must be returned unchanged.
    async fn check_health(
        &self,
        regions: &[RegionDefinition],
        current: &[RegionHealth],
    ) -> Result<Vec<RegionHealth>>;
}
