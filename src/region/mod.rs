//! Multi-region Module
//!
//! Provides regional deployment management:
//! - Region definitions and health state
//! - Deployment orchestrator (deploy, failover, promote, weights)
//! - Failover history and state synchronization

pub mod definition;
pub mod failover;
pub mod orchestrator;
pub mod state;
pub mod sync;

pub use definition::{HealthCheckConfig, Priority, RegionDefinition};
pub use failover::{FailoverEvent, FailoverHistory};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use state::{initial_weights, OrchestratorState, OrchestratorStatus, RegionHealth, RegionStatus};
pub use sync::{routing_fingerprint, SyncReport};
