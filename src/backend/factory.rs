//! Backend factory.
//!
//! Creates provider backends based on configuration.

use crate::backend::mock::MockBackend;
use crate::backend::provider::{BackendType, RegionBackend};
use crate::core::{Error, Result};
use std::sync::Arc;

/// Create a backend for the given type.
///
/// Only the mock backend is implemented. Cloud providers are recognised but
/// rejected here so an orchestrator never initializes half-way.
pub fn create_backend(backend_type: BackendType) -> Result<Arc<dyn RegionBackend>> {
    match backend_type {
        BackendType::Mock => Ok(Arc::new(MockBackend::new()) as Arc<dyn RegionBackend>),
        BackendType::Aws | BackendType::Gcp => Err(Error::UnsupportedProvider {
            provider: backend_type.to_string(),
            module: None,
        }),
    }
}

/// Parse a `provider` config value and create its backend.
pub fn create_backend_for_provider(provider: &str) -> Result<Arc<dyn RegionBackend>> {
    create_backend(provider.parse()?)
}
