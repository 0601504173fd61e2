//! # regionflow - Multi-Region Deployment & Traffic Orchestration
//!
//! Manages a fleet of deployment regions for one application:
//! - **Region**: orchestrator state, failover, promotion, weights and sync
//! - **Backend**: pluggable provider backends (mock included)
//! - **Routing**: per-request region selection by latency or priority
//! - **Pipeline**: declarative steps driving orchestrators by name
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use regionflow::region::{Orchestrator, OrchestratorConfig, Priority, RegionDefinition};
//!
//! #[tokio::main]
//! async fn main() -> regionflow::Result<()> {
//!     let config = OrchestratorConfig::mock(vec![
//!         RegionDefinition::new("us-east-1", Priority::Primary),
//!         RegionDefinition::new("us-west-2", Priority::Secondary),
//!     ]);
//!     let orchestrator = Orchestrator::new("prod-regions", config)?;
//!     orchestrator.deploy("us-east-1").await?;
//!     orchestrator.failover("us-east-1", "us-west-2").await?;
//!     println!("active: {}", orchestrator.status().await?.active_region);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod core;
pub mod monitoring;
pub mod pipeline;
pub mod region;
pub mod registry;
pub mod routing;

pub use config::AppConfig;
pub use core::error::{Error, Result};
