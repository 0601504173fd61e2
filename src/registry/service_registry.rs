//! Service registry for named module instances.
//!
//! Modules register themselves under their configured name; pipeline steps
//! and status endpoints resolve them back by name and expected type.

use crate::core::{now, Error, Result, Timestamp};
use parking_lot::RwLock;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::Arc;

/// Registered service entry.
#[derive(Clone)]
pub struct RegisteredService {
    /// Service instance
    instance: Arc<dyn Any + Send + Sync>,
    /// Human-readable description
    pub description: String,
    /// Concrete type name of the instance
    pub type_name: &'static str,
    /// Registration time
    pub registered_at: Timestamp,
}

/// Summary of a registered service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceInfo {
    pub name: String,
    pub description: String,
    pub type_name: &'static str,
    pub registered_at: Timestamp,
}

/// Name-keyed registry of shared services.
#[derive(Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, RegisteredService>>,
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let services = self.services.read();
        let mut names: Vec<&str> = services.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ServiceRegistry").field("services", &names).finish()
    }
}

impl ServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under `name`.
    pub fn register<T>(&self, name: &str, description: &str, instance: Arc<T>) -> Result<()>
    where
        T: Any + Send + Sync,
    {
        let mut services = self.services.write();
        if services.contains_key(name) {
            return Err(Error::DuplicateService(name.to_string()));
        }
        services.insert(
            name.to_string(),
            RegisteredService {
                instance,
                description: description.to_string(),
                type_name: type_name::<T>(),
                registered_at: now(),
            },
        );
        tracing::debug!(service = name, kind = type_name::<T>(), "registered service");
        Ok(())
    }

    /// Remove a service.
    pub fn unregister(&self, name: &str) -> Result<()> {
        self.services
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::ServiceNotFound(name.to_string()))
    }

    /// Resolve a service by name, checking its type.
    pub fn resolve<T>(&self, name: &str) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let instance = self
            .services
            .read()
            .get(name)
            .map(|s| Arc::clone(&s.instance))
            .ok_or_else(|| Error::ServiceNotFound(name.to_string()))?;

        instance.downcast::<T>().map_err(|_| Error::ServiceTypeMismatch {
            name: name.to_string(),
            expected: type_name::<T>(),
        })
    }

    /// Whether a service is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.services.read().contains_key(name)
    }

    /// List all services, sorted by name.
    pub fn list(&self) -> Vec<ServiceInfo> {
        let mut infos: Vec<ServiceInfo> = self
            .services
            .read()
            .iter()
            .map(|(name, s)| ServiceInfo {
                name: name.clone(),
                description: s.description.clone(),
                type_name: s.type_name,
                registered_at: s.registered_at,
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Get service count.
    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }
}
