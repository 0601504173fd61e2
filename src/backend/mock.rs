//! Mock backend implementation.
//!
//! Simulates a provider entirely in memory. Every call succeeds immediately
//! and latencies are a deterministic function of registry position.

use crate::backend::provider::{BackendType, DeployOutcome, RegionBackend};
use crate::core::Result;
use crate::region::definition::RegionDefinition;
use crate::region::state::{OrchestratorState, RegionHealth, RegionStatus};
use crate::region::sync::{routing_fingerprint, SyncReport};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Latency reported by a freshly deployed region (ms).
pub const DEPLOY_LATENCY_MS: u32 = 10;

/// Simulated health-check latency for the region at `index`.
pub fn simulated_latency(index: usize) -> u32 {
    5 + index as u32 * 3
}

/// In-memory backend for tests and local runs.
#[derive(Debug, Default)]
pub struct MockBackend {
    sync_version: AtomicU64,
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegionBackend for MockBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Mock
    }

    async fn deploy(&self, _region: &RegionDefinition) -> Result<DeployOutcome> {
        Ok(DeployOutcome {
            latency: DEPLOY_LATENCY_MS,
        })
    }

    async fn failover(&self, _from: &RegionDefinition, _to: &RegionDefinition) -> Result<()> {
        Ok(())
    }

    async fn promote(&self, _region: &RegionDefinition) -> Result<()> {
        Ok(())
    }

    async fn set_weight(&self, _region: &RegionDefinition, _weight: u32) -> Result<()> {
        Ok(())
    }

    async fn sync(&self, regions: &[RegionDefinition], snapshot: &OrchestratorState) -> Result<SyncReport> {
        let state_hash = routing_fingerprint(snapshot)?;
        let version = self.sync_version.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SyncReport::new(version, state_hash, regions.len()))
    }

    async fn check_health(
        &self,
        _regions: &[RegionDefinition],
        current: &[RegionHealth],
    ) -> Result<Vec<RegionHealth>> {
        Ok(current
            .iter()
            .enumerate()
            .map(|(i, h)| match h.status {
                RegionStatus::Failed => h.clone(),
                _ => RegionHealth {
                    name: h.name.clone(),
                    status: RegionStatus::Healthy,
                    latency: simulated_latency(i),
                },
            })
            .collect())
    }
}
