//! Hardware driver trait and error types.
//!
//! This module defines:
//! - `HardwareDriver` trait - Interface for pluggable hardware backends
//! - `HalError` enum - Error types for HAL operations
//! - `HardwareLayout` - Where the freedrive slots live in the table
//! - `DriverFactory` type alias - Factory function type
//! - `DriverDiagnostics` struct - Optional driver diagnostics

use freedrive_common::slots::{HardwarePort, SlotError, SlotName, SlotRegistry};
use std::time::Duration;
use thiserror::Error;

use crate::config::HalConfig;

/// Error types for HAL operations.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// Driver name registered twice
    #[error("Driver already registered: {0}")]
    DuplicateDriver(String),

    /// Slot layout does not carry the freedrive slots
    #[error("Slot layout error: {0}")]
    Slot(#[from] SlotError),
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn() -> Box<dyn HardwareDriver>;

/// Optional driver diagnostics.
#[derive(Debug, Clone, Default)]
pub struct DriverDiagnostics {
    /// Number of cycles executed
    pub cycle_count: u64,
    /// Handshakes answered
    pub responses: u64,
    /// Driver-specific diagnostics (JSON string)
    pub custom: Option<String>,
}

/// Table positions of the freedrive slots, seen from the hardware side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareLayout {
    /// Async-status handshake slot (Command namespace).
    pub async_success: u16,
    /// Requested mode (Command namespace).
    pub cmd: u16,
    /// Abort trigger, if the interface exports it.
    pub abort: Option<u16>,
    /// Disable trigger, if the interface exports it.
    pub disable: Option<u16>,
    /// Initialized flag (State namespace).
    pub initialized: u16,
}

impl HardwareLayout {
    /// Resolve the freedrive slots from a registry.
    ///
    /// # Errors
    /// Any required slot missing or declared with the wrong namespace/encoding.
    pub fn from_registry(registry: &SlotRegistry, prefix: &str) -> Result<Self, HalError> {
        let optional = |name: SlotName| -> Result<Option<u16>, HalError> {
            match registry.resolve(name, prefix) {
                Ok(id) => Ok(Some(id.index)),
                Err(SlotError::Missing { .. }) => Ok(None),
                Err(e) => Err(e.into()),
            }
        };
        Ok(Self {
            async_success: registry.resolve(SlotName::FreedriveModeAsyncSuccess, prefix)?.index,
            cmd: registry.resolve(SlotName::FreedriveModeCmd, prefix)?.index,
            abort: optional(SlotName::Abort)?,
            disable: optional(SlotName::Disable)?,
            initialized: registry.resolve(SlotName::InitializedFlag, prefix)?.index,
        })
    }
}

/// Trait defining the interface for hardware drivers.
///
/// `HalCore` manages drivers through this trait, enabling pluggable
/// backends (simulation, robot client library, etc.).
///
/// # Lifecycle
///
/// 1. `init()` - Called once before the hardware loop starts
/// 2. `cycle()` - Called every cycle from the hardware loop
/// 3. `shutdown()` - Called when `HalCore` is stopping
///
/// # Timing Contracts
///
/// | Operation | RT Constraint |
/// |-----------|---------------|
/// | `init()` | None (pre-loop) |
/// | `cycle()` | **HARD**, must finish within the cycle |
/// | `shutdown()` | None (post-loop) |
pub trait HardwareDriver: Send {
    /// Returns the driver's unique identifier (e.g., "simulation").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Initialize the driver.
    ///
    /// # Errors
    /// Return `HalError::InitFailed` if initialization cannot complete.
    fn init(&mut self, config: &HalConfig, layout: HardwareLayout) -> Result<(), HalError>;

    /// Execute one hardware cycle.
    ///
    /// Reads Command slots, publishes State slots and answers pending
    /// handshakes through `port`. No allocations, no blocking.
    fn cycle(&mut self, port: &HardwarePort, dt: Duration);

    /// Graceful shutdown of the driver.
    fn shutdown(&mut self) -> Result<(), HalError>;

    /// Get driver-specific diagnostics.
    /// Default: None
    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        None
    }
}
