//! Value encodings for `f64` interface slots.

use serde::{Deserialize, Serialize};

/// Reserved async-status value: hardware has not answered yet.
pub const ASYNC_WAITING: f64 = 2.0;

/// Flag value for "set" / async success.
pub const FLAG_ON: f64 = 1.0;

/// Flag value for "clear" / async failure.
pub const FLAG_OFF: f64 = 0.0;

/// Convention used to interpret a slot's `f64` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotEncoding {
    /// Boolean stored as 0.0 / 1.0.
    Flag,
    /// Handshake status: [`ASYNC_WAITING`] while pending, then 1.0 (success) or 0.0 (failure).
    AsyncStatus,
    /// Unconstrained scalar.
    Scalar,
}

impl SlotEncoding {
    /// Whether `value` is a legal value under this encoding.
    pub fn accepts(self, value: f64) -> bool {
        match self {
            Self::Flag => value == FLAG_OFF || value == FLAG_ON,
            Self::AsyncStatus => value == FLAG_OFF || value == FLAG_ON || value == ASYNC_WAITING,
            Self::Scalar => value.is_finite(),
        }
    }

    /// Value a slot of this encoding is reset to when no operation is in flight.
    pub const fn neutral(self) -> f64 {
        FLAG_OFF
    }
}

/// Encode a boolean as a flag value.
#[inline]
pub const fn encode_flag(on: bool) -> f64 {
    if on { FLAG_ON } else { FLAG_OFF }
}

/// Decode a flag value. Anything at or above 0.5 reads as set.
#[inline]
pub fn decode_flag(value: f64) -> bool {
    value >= 0.5
}

/// Decoded view of an async-status slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncStatus {
    /// Sentinel still present.
    Waiting,
    /// Hardware confirmed the command.
    Succeeded,
    /// Hardware reported the command failed.
    Failed,
}

impl AsyncStatus {
    /// Decode a raw slot value. Any non-sentinel value other than 1.0 is a failure.
    #[inline]
    pub fn decode(value: f64) -> Self {
        if value == ASYNC_WAITING {
            Self::Waiting
        } else if value == FLAG_ON {
            Self::Succeeded
        } else {
            Self::Failed
        }
    }

    /// Raw slot value for this status.
    #[inline]
    pub const fn value(self) -> f64 {
        match self {
            Self::Waiting => ASYNC_WAITING,
            Self::Succeeded => FLAG_ON,
            Self::Failed => FLAG_OFF,
        }
    }
}
