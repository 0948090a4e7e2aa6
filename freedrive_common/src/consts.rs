//! Workspace-wide constants.
//!
//! Single source of truth for slot table sizes, configuration bounds and the
//! default interface layout of the robot hardware interface.

use static_assertions::const_assert;

/// Number of Command slots in the shared slot table.
pub const MAX_COMMAND_SLOTS: usize = 64;

/// Number of State slots in the shared slot table.
pub const MAX_STATE_SLOTS: usize = 64;

/// Maximum number of named slots a registry can describe.
pub const MAX_REGISTERED_SLOTS: usize = 32;

/// Maximum length of a fully-qualified slot name (prefix included).
pub const SLOT_NAME_CAPACITY: usize = 64;

const_assert!(MAX_REGISTERED_SLOTS <= MAX_COMMAND_SLOTS + MAX_STATE_SLOTS);
const_assert!(MAX_COMMAND_SLOTS <= u16::MAX as usize);
const_assert!(MAX_STATE_SLOTS <= u16::MAX as usize);

// ─── Cycle timing ───────────────────────────────────────────────────

/// Default control cycle time in microseconds (500 Hz).
pub const CYCLE_TIME_US: u32 = 2000;

/// Shortest accepted control cycle [µs].
pub const CYCLE_TIME_US_MIN: u32 = 500;

/// Longest accepted control cycle [µs].
pub const CYCLE_TIME_US_MAX: u32 = 8000;

// ─── Controller parameters ──────────────────────────────────────────

/// Default retry budget for async hardware confirmation [cycles].
pub const MAXIMUM_RETRIES_DEFAULT: u32 = 10;

/// Upper bound on the retry budget [cycles].
pub const MAXIMUM_RETRIES_MAX: u32 = 100_000;

/// Default monitoring timer period [s] (20 Hz).
pub const ACTION_MONITOR_PERIOD_DEFAULT: f64 = 0.05;

/// Longest accepted monitoring timer period [s].
pub const ACTION_MONITOR_PERIOD_MAX: f64 = 10.0;

// ─── Default hardware interface layout ──────────────────────────────

/// Command index of `freedrive_mode/async_success`.
pub const FREEDRIVE_MODE_ASYNC_SUCCESS_INDEX: u16 = 25;

/// Command index of `freedrive_mode/enable`.
pub const FREEDRIVE_MODE_CMD_INDEX: u16 = 26;

/// Command index of `freedrive_mode/abort`.
pub const FREEDRIVE_MODE_ABORT_INDEX: u16 = 27;

/// Command index of `freedrive_mode/disable`.
pub const FREEDRIVE_MODE_DISABLE_INDEX: u16 = 28;

/// State index of `system_interface/initialized`.
pub const INITIALIZED_FLAG_INDEX: u16 = 0;

/// Default configuration file path for the controller binary.
pub const DEFAULT_CONFIG_PATH: &str = "config/freedrive.toml";
