//! Slot registry: the host-provided name → slot table.
//!
//! Built once at startup from a [`SlotLayout`]. Immutable after construction.
//! Storage is fixed-capacity (`heapless`), so a registry never grows after the
//! host hands it to the controller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::encoding::SlotEncoding;
use super::name::{SlotId, SlotName, SlotNamespace};
use crate::consts::{
    FREEDRIVE_MODE_ABORT_INDEX, FREEDRIVE_MODE_ASYNC_SUCCESS_INDEX, FREEDRIVE_MODE_CMD_INDEX,
    FREEDRIVE_MODE_DISABLE_INDEX, INITIALIZED_FLAG_INDEX, MAX_COMMAND_SLOTS,
    MAX_REGISTERED_SLOTS, MAX_STATE_SLOTS, SLOT_NAME_CAPACITY,
};

// ─── Error Types ────────────────────────────────────────────────────

/// Slot layout validation or resolution error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    /// Two entries share a name.
    #[error("duplicate slot name '{name}'")]
    DuplicateName {
        /// Offending name.
        name: String,
    },

    /// Two entries share a namespace/index pair.
    #[error("slot {id} declared twice ('{first}' and '{second}')")]
    DuplicateId {
        /// Shared id.
        id: SlotId,
        /// First declaration.
        first: String,
        /// Second declaration.
        second: String,
    },

    /// Index does not fit the slot table.
    #[error("slot '{name}' index {index} out of range (capacity {capacity})")]
    IndexOutOfRange {
        /// Offending name.
        name: String,
        /// Declared index.
        index: u16,
        /// Namespace capacity.
        capacity: usize,
    },

    /// More entries than the registry can hold.
    #[error("slot layout has more than {capacity} entries")]
    CapacityExceeded {
        /// Registry capacity.
        capacity: usize,
    },

    /// Name longer than the fixed name buffer.
    #[error("slot name '{name}' longer than {capacity} bytes")]
    NameTooLong {
        /// Offending name.
        name: String,
        /// Maximum length.
        capacity: usize,
    },

    /// Empty name.
    #[error("slot name cannot be empty")]
    EmptyName,

    /// Encoding not allowed in this namespace.
    #[error("slot '{name}': {encoding:?} encoding is not allowed in the state namespace")]
    EncodingNotAllowed {
        /// Offending name.
        name: String,
        /// Declared encoding.
        encoding: SlotEncoding,
    },

    /// A slot the controller requires is absent.
    #[error("required slot '{name}' not found")]
    Missing {
        /// Qualified name looked up.
        name: String,
    },

    /// The slot exists in the wrong namespace.
    #[error("slot '{name}' expected in {expected} namespace, found in {actual}")]
    NamespaceMismatch {
        /// Qualified name.
        name: String,
        /// Required namespace.
        expected: SlotNamespace,
        /// Declared namespace.
        actual: SlotNamespace,
    },

    /// The slot exists with the wrong value encoding.
    #[error("slot '{name}' expected {expected:?} encoding, found {actual:?}")]
    EncodingMismatch {
        /// Qualified name.
        name: String,
        /// Required encoding.
        expected: SlotEncoding,
        /// Declared encoding.
        actual: SlotEncoding,
    },
}

// ─── Layout (TOML) ──────────────────────────────────────────────────

/// One slot declaration as it appears in configuration.
///
/// ```toml
/// [[slots]]
/// name = "freedrive_mode/enable"
/// namespace = "command"
/// index = 26
/// encoding = "flag"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSpec {
    /// Fully-qualified interface name.
    pub name: String,
    /// Command or State.
    pub namespace: SlotNamespace,
    /// Index within the namespace.
    pub index: u16,
    /// Value convention.
    #[serde(default = "default_encoding")]
    pub encoding: SlotEncoding,
}

fn default_encoding() -> SlotEncoding {
    SlotEncoding::Scalar
}

/// Declared slot table of a hardware interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotLayout {
    /// All declared slots, in table order.
    #[serde(default)]
    pub slots: Vec<SlotSpec>,
}

impl SlotLayout {
    /// Layout exported by the robot hardware interface, names prefixed with `prefix`.
    pub fn robot_default(prefix: &str) -> Self {
        let role = |name: SlotName, index: u16| SlotSpec {
            name: name.qualified(prefix),
            namespace: name.namespace(),
            index,
            encoding: name.encoding(),
        };
        Self {
            slots: vec![
                role(SlotName::InitializedFlag, INITIALIZED_FLAG_INDEX),
                SlotSpec {
                    name: format!("{prefix}speed_scaling/speed_scaling_factor"),
                    namespace: SlotNamespace::State,
                    index: 1,
                    encoding: SlotEncoding::Scalar,
                },
                SlotSpec {
                    name: format!("{prefix}system_interface/robot_program_running"),
                    namespace: SlotNamespace::State,
                    index: 2,
                    encoding: SlotEncoding::Flag,
                },
                role(
                    SlotName::FreedriveModeAsyncSuccess,
                    FREEDRIVE_MODE_ASYNC_SUCCESS_INDEX,
                ),
                role(SlotName::FreedriveModeCmd, FREEDRIVE_MODE_CMD_INDEX),
                role(SlotName::Abort, FREEDRIVE_MODE_ABORT_INDEX),
                role(SlotName::Disable, FREEDRIVE_MODE_DISABLE_INDEX),
            ],
        }
    }

    /// Drop every entry with the given name. Used to model interfaces that lack optional slots.
    pub fn without(mut self, name: &str) -> Self {
        self.slots.retain(|s| s.name != name);
        self
    }
}

// ─── Registry ───────────────────────────────────────────────────────

/// Validated slot entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotDescriptor {
    name: heapless::String<SLOT_NAME_CAPACITY>,
    /// Position in the slot table.
    pub id: SlotId,
    /// Value convention.
    pub encoding: SlotEncoding,
}

impl SlotDescriptor {
    /// Fully-qualified name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// Name-indexed, order-stable slot table description.
#[derive(Debug, Clone, Default)]
pub struct SlotRegistry {
    entries: heapless::Vec<SlotDescriptor, MAX_REGISTERED_SLOTS>,
}

impl SlotRegistry {
    /// Build the registry from a layout, running all validation rules.
    ///
    /// Returns the first validation error encountered.
    pub fn from_layout(layout: &SlotLayout) -> Result<Self, SlotError> {
        let mut entries: heapless::Vec<SlotDescriptor, MAX_REGISTERED_SLOTS> =
            heapless::Vec::new();

        for spec in &layout.slots {
            validate_spec(spec)?;

            if let Some(existing) = entries.iter().find(|e| e.name() == spec.name) {
                return Err(SlotError::DuplicateName {
                    name: existing.name().to_string(),
                });
            }
            let id = SlotId {
                namespace: spec.namespace,
                index: spec.index,
            };
            if let Some(existing) = entries.iter().find(|e| e.id == id) {
                return Err(SlotError::DuplicateId {
                    id,
                    first: existing.name().to_string(),
                    second: spec.name.clone(),
                });
            }

            let name = heapless::String::try_from(spec.name.as_str()).map_err(|_| {
                SlotError::NameTooLong {
                    name: spec.name.clone(),
                    capacity: SLOT_NAME_CAPACITY,
                }
            })?;
            entries
                .push(SlotDescriptor {
                    name,
                    id,
                    encoding: spec.encoding,
                })
                .map_err(|_| SlotError::CapacityExceeded {
                    capacity: MAX_REGISTERED_SLOTS,
                })?;
        }

        Ok(Self { entries })
    }

    /// Look up a slot by fully-qualified name.
    pub fn lookup(&self, name: &str) -> Option<&SlotDescriptor> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Resolve a controller role, checking namespace and encoding.
    pub fn resolve(&self, role: SlotName, prefix: &str) -> Result<SlotId, SlotError> {
        let name = role.qualified(prefix);
        let entry = self
            .lookup(&name)
            .ok_or_else(|| SlotError::Missing { name: name.clone() })?;

        if entry.id.namespace != role.namespace() {
            return Err(SlotError::NamespaceMismatch {
                name,
                expected: role.namespace(),
                actual: entry.id.namespace,
            });
        }
        if entry.encoding != role.encoding() {
            return Err(SlotError::EncodingMismatch {
                name,
                expected: role.encoding(),
                actual: entry.encoding,
            });
        }
        Ok(entry.id)
    }

    /// All entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &SlotDescriptor> {
        self.entries.iter()
    }

    /// Number of registered slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no slot is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_spec(spec: &SlotSpec) -> Result<(), SlotError> {
    if spec.name.is_empty() {
        return Err(SlotError::EmptyName);
    }
    let capacity = match spec.namespace {
        SlotNamespace::Command => MAX_COMMAND_SLOTS,
        SlotNamespace::State => MAX_STATE_SLOTS,
    };
    if spec.index as usize >= capacity {
        return Err(SlotError::IndexOutOfRange {
            name: spec.name.clone(),
            index: spec.index,
            capacity,
        });
    }
    if spec.namespace == SlotNamespace::State && spec.encoding == SlotEncoding::AsyncStatus {
        return Err(SlotError::EncodingNotAllowed {
            name: spec.name.clone(),
            encoding: spec.encoding,
        });
    }
    Ok(())
}
