//! Controller lifecycle transitions driven by the host.
//!
//! Unconfigured → Inactive ↔ Active, Inactive → Unconfigured, any → Finalized.
//!
//! The state is kept in an `AtomicU8` on the controller so the monitor and
//! the goal callbacks can read it without locks; this module is the pure
//! transition table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Host lifecycle state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LifecycleState {
    /// Constructed, no parameters.
    #[default]
    Unconfigured = 0,
    /// Parameters loaded and slots resolved, not running.
    Inactive = 1,
    /// Slots bound, update running, goals accepted.
    Active = 2,
    /// Shut down. Terminal.
    Finalized = 3,
}

impl LifecycleState {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Unconfigured),
            1 => Some(Self::Inactive),
            2 => Some(Self::Active),
            3 => Some(Self::Finalized),
            _ => None,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unconfigured => "unconfigured",
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::Finalized => "finalized",
        };
        f.write_str(s)
    }
}

/// Host request that moves the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// `on_configure`.
    Configure,
    /// `on_activate`.
    Activate,
    /// `on_deactivate`.
    Deactivate,
    /// `on_cleanup`.
    Cleanup,
    /// `on_shutdown`.
    Shutdown,
}

impl LifecycleEvent {
    /// Hook name, used in errors and logs.
    pub const fn hook(self) -> &'static str {
        match self {
            Self::Configure => "on_configure",
            Self::Activate => "on_activate",
            Self::Deactivate => "on_deactivate",
            Self::Cleanup => "on_cleanup",
            Self::Shutdown => "on_shutdown",
        }
    }
}

/// Result of a lifecycle transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleTransition {
    /// Transition allowed, new state.
    Ok(LifecycleState),
    /// Transition rejected, reason.
    Rejected(&'static str),
}

/// Lifecycle transition table.
pub struct LifecycleMachine;

impl LifecycleMachine {
    /// Next state for `event` in `state`.
    pub const fn handle_event(state: LifecycleState, event: LifecycleEvent) -> LifecycleTransition {
        use LifecycleEvent::*;
        use LifecycleState::*;

        let next = match (state, event) {
            (Unconfigured, Configure) => Inactive,
            (Inactive, Activate) => Active,
            (Active, Deactivate) => Inactive,
            (Inactive, Cleanup) => Unconfigured,
            (Finalized, _) => return LifecycleTransition::Rejected("controller finalized"),
            (_, Shutdown) => Finalized,
            (Active, _) => return LifecycleTransition::Rejected("deactivate first"),
            (Inactive, _) => return LifecycleTransition::Rejected("already configured"),
            (Unconfigured, _) => return LifecycleTransition::Rejected("configure first"),
        };
        LifecycleTransition::Ok(next)
    }
}
