//! Driver registry for hardware drivers.
//!
//! Constructor-injected, no global state: the registry is populated at startup
//! and handed to `HalCore` by value.

use std::collections::HashMap;

use crate::driver::{DriverFactory, HalError, HardwareDriver};
use crate::drivers::simulation;

/// Registry of available hardware drivers.
pub struct DriverRegistry {
    factories: HashMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with every built-in driver.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.factories.insert(simulation::NAME, simulation::create_driver);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Errors
    /// Returns `HalError::DuplicateDriver` if the name is taken.
    pub fn register(&mut self, name: &'static str, factory: DriverFactory) -> Result<(), HalError> {
        if self.factories.contains_key(name) {
            return Err(HalError::DuplicateDriver(name.to_string()));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Create a driver instance by name.
    ///
    /// # Errors
    /// Returns `HalError::DriverNotFound` if no driver with the given name is registered.
    pub fn create_driver(&self, name: &str) -> Result<Box<dyn HardwareDriver>, HalError> {
        let factory = self
            .factories
            .get(name)
            .copied()
            .ok_or_else(|| HalError::DriverNotFound(name.to_string()))?;
        Ok(factory())
    }

    /// List all registered driver names.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
