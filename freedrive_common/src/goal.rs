//! Goal data model shared between the controller and request channels.
//!
//! A goal is a single request to enter or leave freedrive mode. Its status is
//! a `#[repr(u8)]` enum so the controller can keep it in an atomic and move it
//! between the RT and non-RT domains without locks.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ─── Identity & Request ─────────────────────────────────────────────

/// Unique goal identifier, monotonic per controller instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GoalId(pub u64);

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "goal#{}", self.0)
    }
}

/// Freedrive goal payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreedriveRequest {
    /// `true` engages freedrive, `false` leaves it.
    pub enable: bool,
}

impl FreedriveRequest {
    /// Engage freedrive.
    pub const ENABLE: Self = Self { enable: true };
    /// Leave freedrive.
    pub const DISABLE: Self = Self { enable: false };
}

impl Default for FreedriveRequest {
    fn default() -> Self {
        Self::ENABLE
    }
}

// ─── Status ─────────────────────────────────────────────────────────

/// Lifecycle status of a goal.
///
/// `Succeeded`, `Canceled` and `Aborted` are terminal; a goal never leaves a
/// terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum GoalStatus {
    /// Received, not yet accepted.
    Pending = 0,
    /// Accepted, hardware command not issued yet.
    Accepted = 1,
    /// Hardware command in flight.
    Executing = 2,
    /// Hardware confirmed the request.
    Succeeded = 3,
    /// Cancellation confirmed.
    Canceled = 4,
    /// Ended without success.
    Aborted = 5,
}

impl GoalStatus {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Pending),
            1 => Some(Self::Accepted),
            2 => Some(Self::Executing),
            3 => Some(Self::Succeeded),
            4 => Some(Self::Canceled),
            5 => Some(Self::Aborted),
            _ => None,
        }
    }

    /// No further transitions possible.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Canceled | Self::Aborted)
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Executing => "executing",
            Self::Succeeded => "succeeded",
            Self::Canceled => "canceled",
            Self::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

// ─── Reasons ────────────────────────────────────────────────────────

/// Why a goal reached its terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TerminalReason {
    /// Hardware confirmed the request.
    #[error("hardware confirmed freedrive mode change")]
    Confirmed = 0,
    /// Retry budget exhausted with the sentinel still present.
    #[error("hardware did not answer within the retry budget")]
    AsyncTimeout = 1,
    /// A newer goal replaced this one.
    #[error("preempted by a newer goal")]
    Preempted = 2,
    /// Client cancellation, confirmed by hardware.
    #[error("canceled on client request")]
    CancelRequested = 3,
    /// Hardware answered with failure.
    #[error("hardware rejected the freedrive command")]
    HardwareRejected = 4,
    /// Hardware interface lost initialization while the goal was running.
    #[error("hardware interface not initialized")]
    HardwareNotReady = 5,
    /// Controller left the Active state.
    #[error("controller is no longer active")]
    ControllerInactive = 6,
}

impl TerminalReason {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Confirmed),
            1 => Some(Self::AsyncTimeout),
            2 => Some(Self::Preempted),
            3 => Some(Self::CancelRequested),
            4 => Some(Self::HardwareRejected),
            5 => Some(Self::HardwareNotReady),
            6 => Some(Self::ControllerInactive),
            _ => None,
        }
    }
}

/// Synchronous goal rejection. The controller's state is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Controller is not Active.
    #[error("controller is not active")]
    ControllerInactive,
    /// A goal is executing and preemption is disabled.
    #[error("another goal is executing")]
    GoalActive,
    /// Hardware interface has not finished initialization.
    #[error("hardware interface not initialized")]
    HardwareNotReady,
}

// ─── Responses & Results ────────────────────────────────────────────

/// Answer to a new goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalResponse {
    /// Goal taken.
    Accept,
    /// Goal refused.
    Reject(RejectReason),
}

/// Answer to a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelResponse {
    /// Cancellation will be attempted.
    Accept,
    /// Unknown or already finished goal.
    Reject,
}

/// Final outcome delivered to the requesting client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalResult {
    /// Terminal status.
    pub status: GoalStatus,
    /// What ended the goal.
    pub reason: TerminalReason,
    /// Human-readable summary.
    pub message: String,
}

impl GoalResult {
    /// Result with the reason's default message.
    pub fn new(status: GoalStatus, reason: TerminalReason) -> Self {
        Self {
            status,
            reason,
            message: reason.to_string(),
        }
    }

    /// Hardware confirmed the request.
    pub fn succeeded(&self) -> bool {
        self.status == GoalStatus::Succeeded
    }
}

/// Result envelope published on report channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalReport {
    /// Goal the result belongs to.
    pub id: GoalId,
    /// Final outcome.
    pub result: GoalResult,
}
