//! Hardware driver implementations.
//!
//! - [`simulation`] - Firmware emulation for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `HardwareDriver` trait from [`crate::driver`]
//! 3. Add the factory to `DriverRegistry::with_builtin()`

pub mod simulation;
