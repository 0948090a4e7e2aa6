//! Interface slots shared with the hardware layer.
//!
//! The hardware interface exposes a fixed table of `f64` cells in two disjoint
//! namespaces. Command slots are written by the controller and read by the
//! hardware; State slots are written by the hardware and only read by the
//! controller. Values are reinterpreted through an explicit [`SlotEncoding`]
//! that is checked when the registry is built and again when the controller
//! resolves the slots it needs.
//!
//! - `name`: slot identifiers, namespaces and the controller's slot roles
//! - `encoding`: value conventions (flags, async status with sentinel)
//! - `registry`: host-provided name → slot table, validated at build time
//! - `table`: the atomic storage plus bound accessors for both sides
//! - `gate`: single-writer arbitration for Command slots

mod encoding;
mod gate;
mod name;
mod registry;
mod table;

pub use encoding::{
    ASYNC_WAITING, AsyncStatus, FLAG_OFF, FLAG_ON, SlotEncoding, decode_flag, encode_flag,
};
pub use gate::{GateOwner, WriteGate, WriteGuard};
pub use name::{OptionalSlots, SlotId, SlotName, SlotNamespace};
pub use registry::{SlotDescriptor, SlotError, SlotLayout, SlotRegistry, SlotSpec};
pub use table::{CommandSlot, HardwarePort, SlotTable, StateSlot};
