//! Service Registry Module
//!
//! Lets modules be looked up by name from pipeline steps and tooling.

pub mod service_registry;

pub use service_registry::{RegisteredService, ServiceInfo, ServiceRegistry};
