//! Prelude module for common re-exports.
//!
//! ```rust
//! use freedrive_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig, Validate};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{CYCLE_TIME_US, MAXIMUM_RETRIES_DEFAULT};

// ─── Slots ──────────────────────────────────────────────────────────
pub use crate::slots::{
    ASYNC_WAITING, AsyncStatus, CommandSlot, HardwarePort, SlotEncoding, SlotId, SlotLayout,
    SlotName, SlotNamespace, SlotRegistry, SlotTable, StateSlot,
};

// ─── Goals ──────────────────────────────────────────────────────────
pub use crate::goal::{
    CancelResponse, FreedriveRequest, GoalId, GoalReport, GoalResponse, GoalResult, GoalStatus,
    RejectReason, TerminalReason,
};
