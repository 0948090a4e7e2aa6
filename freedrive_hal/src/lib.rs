//! # Freedrive HAL Library
//!
//! Hardware side of the freedrive slot table with a pluggable driver
//! architecture.
//!
//! The controller and the hardware share one [`SlotTable`]. The controller
//! writes Command slots and reads State slots; a [`HardwareDriver`] running
//! inside [`HalCore`] does the opposite through a [`HardwarePort`], and answers
//! async handshakes by resolving armed status slots.
//!
//! # Module Structure
//!
//! - [`config`] - HAL and simulation configuration
//! - [`driver`] - `HardwareDriver` trait, errors, hardware-side slot layout
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Driver implementations
//! - [`core`] - `HalCore`, periodic hardware loop
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       freedrive_hal                          │
//! │  ┌─────────────┐    ┌──────────────┐    ┌────────────────┐   │
//! │  │  SlotTable  │◄──►│   HalCore    │◄──►│ DriverRegistry │   │
//! │  │  (common)   │    │  (hw loop)   │    │                │   │
//! │  └─────────────┘    └──────┬───────┘    └────────────────┘   │
//! │                            │                                 │
//! │                            ▼                                 │
//! │                   ┌────────────────┐                         │
//! │                   │ HardwareDriver │ (trait object)          │
//! │                   └────────────────┘                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`SlotTable`]: freedrive_common::slots::SlotTable
//! [`HardwarePort`]: freedrive_common::slots::HardwarePort

#![deny(missing_docs)]

pub mod config;
pub mod core;
pub mod driver;
pub mod driver_registry;
pub mod drivers;

pub use crate::config::{HalConfig, SimulationConfig};
pub use crate::core::{HalCore, HalStats};
pub use crate::driver::{HalError, HardwareDriver, HardwareLayout};
pub use crate::driver_registry::DriverRegistry;
