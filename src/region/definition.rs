//! Region definitions parsed from configuration.
//!
//! A [`RegionDefinition`] is immutable once an orchestrator or router has been
//! built from it. Promotion changes which region the *state* treats as
//! primary, never the definition list.

use crate::core::types::{loose_u32, loose_u64};
use crate::core::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// Priority class of a region.
///
/// Ordering follows precedence: primary before secondary before dr.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Designated primary region
    Primary,
    /// Warm standby
    #[default]
    Secondary,
    /// Disaster recovery
    Dr,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Primary => write!(f, "primary"),
            Priority::Secondary => write!(f, "secondary"),
            Priority::Dr => write!(f, "dr"),
        }
    }
}

/// Health check settings for a region.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Seconds between checks
    #[serde(deserialize_with = "loose_u64")]
    pub interval: u64,
    /// Seconds before a check times out
    #[serde(deserialize_with = "loose_u64")]
    pub timeout: u64,
    /// HTTP path probed by real backends
    pub path: String,
    /// Consecutive failures before a region is marked degraded
    #[serde(
        rename = "threshold",
        alias = "failure_threshold",
        alias = "failureThreshold",
        deserialize_with = "loose_u32"
    )]
    pub failure_threshold: u32,
}

impl HealthCheckConfig {
    /// Check interval, if one is configured.
    pub fn interval(&self) -> Option<Duration> {
        (self.interval > 0).then(|| Duration::from_secs(self.interval))
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval: 30,
            timeout: 5,
            path: "/health".to_string(),
            failure_threshold: 3,
        }
    }
}

/// A deployment region.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDefinition {
    /// Unique region name (e.g. `us-east-1`)
    pub name: String,
    /// Infrastructure provider hosting the region
    #[serde(default)]
    pub provider: String,
    /// Service endpoint in the region
    #[serde(default)]
    pub endpoint: String,
    /// Priority class
    #[serde(default)]
    pub priority: Priority,
    /// Health check settings
    #[serde(default, rename = "health_check", alias = "healthCheck")]
    pub health_check: HealthCheckConfig,
}

impl RegionDefinition {
    /// Create a new region definition.
    pub fn new(name: &str, priority: Priority) -> Self {
        Self {
            name: name.to_string(),
            provider: String::new(),
            endpoint: String::new(),
            priority,
            health_check: HealthCheckConfig::default(),
        }
    }

    /// Set provider.
    pub fn with_provider(mut self, provider: &str) -> Self {
        self.provider = provider.to_string();
        self
    }

    /// Set endpoint.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// Set health check settings.
    pub fn with_health_check(mut self, health_check: HealthCheckConfig) -> Self {
        self.health_check = health_check;
        self
    }

    /// Whether this region is the configured primary.
    pub fn is_primary(&self) -> bool {
        self.priority == Priority::Primary
    }
}

/// Check that every region has a non-empty name and that no name repeats.
///
/// `owner` prefixes error messages, e.g. `platform.region "prod"`.
pub fn validate_region_names(owner: &str, regions: &[RegionDefinition]) -> crate::core::Result<()> {
    let mut seen = HashSet::new();
    for region in regions {
        if region.name.is_empty() {
            return Err(Error::Configuration(format!(
                "{}: region name must not be empty",
                owner
            )));
        }
        if !seen.insert(region.name.as_str()) {
            return Err(Error::Configuration(format!(
                "{}: duplicate region {:?}",
                owner, region.name
            )));
        }
    }
    Ok(())
}
