//! Routing modes, configuration and metrics.

use crate::core::{Error, Result};
use crate::region::definition::RegionDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// How the selector picks a region for a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    /// Lowest observed latency
    #[default]
    Latency,
    /// Priority class: primary, then secondary, then dr
    Geo,
}

impl fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingMode::Latency => write!(f, "latency"),
            RoutingMode::Geo => write!(f, "geo"),
        }
    }
}

/// Routing selector configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Selection mode
    #[serde(default)]
    pub mode: RoutingMode,
    /// Initial regions; may also be set later
    #[serde(default)]
    pub regions: Vec<RegionDefinition>,
}

impl RoutingConfig {
    /// Config with a mode and no regions.
    pub fn with_mode(mode: RoutingMode) -> Self {
        Self {
            mode,
            regions: Vec::new(),
        }
    }

    /// Parse from a loosely-typed config map.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::Configuration(e.to_string()))
    }
}

/// Snapshot of routing counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingMetrics {
    pub total_routes: u64,
    pub successful_routes: u64,
    pub failed_routes: u64,
}

/// Lock-free routing counters.
#[derive(Debug, Default)]
pub(crate) struct RoutingCounters {
    successful: AtomicU64,
    failed: AtomicU64,
}

impl RoutingCounters {
    pub(crate) fn record(&self, success: bool) {
        let counter = if success { &self.successful } else { &self.failed };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> RoutingMetrics {
        let successful_routes = self.successful.load(Ordering::Relaxed);
        let failed_routes = self.failed.load(Ordering::Relaxed);
        RoutingMetrics {
            total_routes: successful_routes + failed_routes,
            successful_routes,
            failed_routes,
        }
    }
}
