//! Driver registry for selecting a backend by name

use std::collections::BTreeMap;
use std::sync::Arc;
use sqllogic_core::{DatabaseDriver, Result, SltError};

/// Registry of available backends, keyed by their short name
pub struct DriverRegistry {
    drivers: BTreeMap<String, Arc<dyn DatabaseDriver>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: BTreeMap::new(),
        }
    }

    /// Create a registry with all built-in drivers registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(crate::none::NoneDriver::new()));
        #[cfg(feature = "sqlite")]
        registry.register(Arc::new(crate::sqlite::SqliteDriver::new()));
        #[cfg(feature = "postgres")]
        registry.register(Arc::new(crate::postgres::PostgresDriver::new()));

        registry
    }

    /// Register a new driver. A driver registered under a name that is
    /// already taken replaces the previous one.
    pub fn register(&mut self, driver: Arc<dyn DatabaseDriver>) {
        let name = driver.name().to_string();
        tracing::debug!(driver = %name, "registering database driver");
        if self.drivers.insert(name.clone(), driver).is_some() {
            tracing::warn!(driver = %name, "replaced previously registered driver");
        }
    }

    /// Get a driver by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let driver = self.drivers.get(name).cloned();
        if driver.is_none() {
            tracing::warn!(driver = %name, "driver not found in registry");
        }
        driver
    }

    /// Get a driver by name, failing with the list of registered names
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn DatabaseDriver>> {
        self.get(name).ok_or_else(|| SltError::UnknownDriver {
            name: name.to_string(),
            available: self.list().into_iter().map(str::to_string).collect(),
        })
    }

    /// List all registered driver names, sorted
    pub fn list(&self) -> Vec<&str> {
        self.drivers.keys().map(|s| s.as_str()).collect()
    }

    /// Check if a driver is registered
    pub fn has(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
