//! Provider Backend Module
//!
//! Pluggable provider backends for the orchestrator:
//! - Backend trait
//! - In-memory mock backend
//! - Config-driven factory

pub mod factory;
pub mod mock;
pub mod provider;

pub use crate::region::sync::SyncReport;
pub use factory::{create_backend, create_backend_for_provider};
pub use mock::MockBackend;
pub use provider::{BackendType, DeployOutcome, RegionBackend};
