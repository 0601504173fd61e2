//! Monitoring Module
//!
//! Observability for the orchestrator:
//! - Structured logging setup
//! - Background health monitoring

pub mod health;
pub mod logging;

pub use health::{run_once, HealthMonitor, DEFAULT_HEALTH_INTERVAL};
pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
