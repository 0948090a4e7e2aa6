//! Slot identifiers and the slot roles the freedrive controller claims.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::encoding::SlotEncoding;

/// Which side of the hardware interface a slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SlotNamespace {
    /// Written by the controller, read by hardware.
    Command = 0,
    /// Written by hardware, read-only for the controller.
    State = 1,
}

impl fmt::Display for SlotNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => f.write_str("command"),
            Self::State => f.write_str("state"),
        }
    }
}

/// Stable position of a slot within its namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId {
    /// Command or State.
    pub namespace: SlotNamespace,
    /// Index within the namespace.
    pub index: u16,
}

impl SlotId {
    /// Command slot at `index`.
    pub const fn command(index: u16) -> Self {
        Self {
            namespace: SlotNamespace::Command,
            index,
        }
    }

    /// State slot at `index`.
    pub const fn state(index: u16) -> Self {
        Self {
            namespace: SlotNamespace::State,
            index,
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.namespace, self.index)
    }
}

/// Slot roles used by the freedrive controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotName {
    /// Handshake slot: armed with the sentinel, resolved by hardware.
    FreedriveModeAsyncSuccess,
    /// Requested freedrive mode (1.0 engaged, 0.0 disengaged).
    FreedriveModeCmd,
    /// Hardware interface finished initialization.
    InitializedFlag,
    /// Optional trigger: abort freedrive immediately.
    Abort,
    /// Optional trigger: leave freedrive mode.
    Disable,
}

impl SlotName {
    /// Every role, required ones first.
    pub const ALL: [Self; 5] = [
        Self::FreedriveModeAsyncSuccess,
        Self::FreedriveModeCmd,
        Self::InitializedFlag,
        Self::Abort,
        Self::Disable,
    ];

    /// Interface name without prefix.
    pub const fn interface_name(self) -> &'static str {
        match self {
            Self::FreedriveModeAsyncSuccess => "freedrive_mode/async_success",
            Self::FreedriveModeCmd => "freedrive_mode/enable",
            Self::InitializedFlag => "system_interface/initialized",
            Self::Abort => "freedrive_mode/abort",
            Self::Disable => "freedrive_mode/disable",
        }
    }

    /// Namespace the role must live in.
    pub const fn namespace(self) -> SlotNamespace {
        match self {
            Self::InitializedFlag => SlotNamespace::State,
            _ => SlotNamespace::Command,
        }
    }

    /// Encoding the role must be declared with.
    pub const fn encoding(self) -> SlotEncoding {
        match self {
            Self::FreedriveModeAsyncSuccess => SlotEncoding::AsyncStatus,
            _ => SlotEncoding::Flag,
        }
    }

    /// Missing required slots fail configuration.
    pub const fn is_required(self) -> bool {
        !matches!(self, Self::Abort | Self::Disable)
    }

    /// Fully-qualified name with the configured prefix (`"{prefix}{name}"`).
    pub fn qualified(self, prefix: &str) -> String {
        format!("{prefix}{}", self.interface_name())
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.interface_name())
    }
}

bitflags! {
    /// Optional slots that were found in the registry at configure time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OptionalSlots: u8 {
        /// `freedrive_mode/abort` is bound.
        const ABORT   = 0x01;
        /// `freedrive_mode/disable` is bound.
        const DISABLE = 0x02;
    }
}

impl OptionalSlots {
    /// Flag for an optional role; empty for required roles.
    pub const fn for_name(name: SlotName) -> Self {
        match name {
            SlotName::Abort => Self::ABORT,
            SlotName::Disable => Self::DISABLE,
            _ => Self::empty(),
        }
    }
}
