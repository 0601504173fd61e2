//! Routing Module
//!
//! Per-request region selection:
//! - Latency and geo (priority) selection modes
//! - Routing-level failover and manual state overrides
//! - Routing counters

pub mod mode;
pub mod selector;

pub use mode::{RoutingConfig, RoutingMetrics, RoutingMode};
pub use selector::{select_region, RoutingSelector};
