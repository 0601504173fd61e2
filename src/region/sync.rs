//! Cross-region state reconciliation.
//!
//! A sync pushes the routing-relevant part of the orchestrator state (active
//! and primary region plus weights) to every region. The fingerprint lets
//! regions compare what they hold against what was pushed.

use crate::core::{now, Result, Timestamp};
use crate::region::state::OrchestratorState;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::collections::BTreeMap;

/// Outcome of a sync.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Monotonic sync version
    pub version: u64,
    /// Hex SHA3-256 of the synchronized routing state
    pub state_hash: String,
    /// Number of regions the state was pushed to
    pub regions: usize,
    /// Sync completion time
    pub synced_at: Timestamp,
}

impl SyncReport {
    /// Create a report for a sync that just completed.
    pub fn new(version: u64, state_hash: String, regions: usize) -> Self {
        Self {
            version,
            state_hash,
            regions,
            synced_at: now(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RoutingView<'a> {
    active_region: &'a str,
    primary_region: &'a str,
    weights: BTreeMap<&'a str, u32>,
}

/// Fingerprint the routing-relevant part of a state.
///
/// Health and latency are excluded; they are per-region observations, not
/// replicated configuration. Weights are hashed in key order.
pub fn routing_fingerprint(state: &OrchestratorState) -> Result<String> {
    let view = RoutingView {
        active_region: &state.active_region,
        primary_region: &state.primary_region,
        weights: state.weights.iter().map(|(k, v)| (k.as_str(), *v)).collect(),
    };
    let bytes = serde_json::to_vec(&view)?;
    Ok(hex::encode(Sha3_256::digest(&bytes)))
}
