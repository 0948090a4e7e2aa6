//! # Freedrive Controller Library
//!
//! Real-time controller that switches a robot arm in and out of freedrive
//! mode. Requests arrive as goals on non-RT threads, travel to the control
//! cycle through a lock-free handoff buffer, and complete through an
//! asynchronous handshake with the hardware over shared interface slots.
//!
//! ## Execution Domains
//!
//! 1. **Goal callbacks**: accept, preempt and cancel goals (any non-RT thread)
//! 2. **Update**: one handshake poll per control cycle (RT thread)
//! 3. **Monitor**: reports finished goals and frees them (timer thread)
//!
//! ## Zero-Allocation RT Path
//!
//! [`FreedriveUpdater::update`] never blocks, allocates or frees. Goal
//! memory is released only by the monitor, once no update is in progress.

pub mod channel;
pub mod command;
pub mod controller;
pub mod cycle;
pub mod error;
pub mod goal;
pub mod lifecycle;
pub mod monitor;
pub mod params;
pub mod slots;
pub mod update;

pub use channel::{GoalChannel, NullChannel, ReportChannel};
pub use controller::FreedriveController;
pub use error::ControllerError;
pub use lifecycle::LifecycleState;
pub use monitor::{GoalMonitor, MonitorHandle};
pub use params::{ControllerConfig, FreedriveParams};
pub use update::{FreedriveUpdater, UpdateStatus};
