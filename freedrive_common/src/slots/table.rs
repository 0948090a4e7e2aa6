//! Atomic slot storage shared between the controller and the hardware layer.
//!
//! Each cell holds the bit pattern of an `f64` in an `AtomicU64`. Writers use
//! `Release`, readers `Acquire`, so a value observed by the other side always
//! comes with everything written before it. Nothing here allocates or waits.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::encoding::{ASYNC_WAITING, AsyncStatus};
use super::gate::{WriteGate, WriteGuard};
use super::name::{SlotId, SlotNamespace};
use super::registry::SlotError;
use crate::consts::{MAX_COMMAND_SLOTS, MAX_STATE_SLOTS};

/// Backing storage for both slot namespaces plus the command write gate.
#[derive(Debug)]
pub struct SlotTable {
    commands: [AtomicU64; MAX_COMMAND_SLOTS],
    states: [AtomicU64; MAX_STATE_SLOTS],
    gate: WriteGate,
}

impl Default for SlotTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotTable {
    /// All cells 0.0, gate free.
    pub const fn new() -> Self {
        Self {
            commands: [const { AtomicU64::new(0) }; MAX_COMMAND_SLOTS],
            states: [const { AtomicU64::new(0) }; MAX_STATE_SLOTS],
            gate: WriteGate::new(),
        }
    }

    /// New table behind an `Arc`, ready to share with the hardware layer.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn cell(&self, id: SlotId) -> Option<&AtomicU64> {
        match id.namespace {
            SlotNamespace::Command => self.commands.get(id.index as usize),
            SlotNamespace::State => self.states.get(id.index as usize),
        }
    }

    /// Current value of any slot; `None` for an index outside the table.
    #[inline]
    pub fn read(&self, id: SlotId) -> Option<f64> {
        self.cell(id)
            .map(|c| f64::from_bits(c.load(Ordering::Acquire)))
    }

    /// Command write arbitration.
    pub fn gate(&self) -> &WriteGate {
        &self.gate
    }

    /// Bind a Command slot accessor.
    pub fn command_slot(self: &Arc<Self>, id: SlotId) -> Result<CommandSlot, SlotError> {
        self.check(id, SlotNamespace::Command)?;
        Ok(CommandSlot {
            table: Arc::clone(self),
            index: id.index as usize,
        })
    }

    /// Bind a read-only State slot accessor.
    pub fn state_slot(self: &Arc<Self>, id: SlotId) -> Result<StateSlot, SlotError> {
        self.check(id, SlotNamespace::State)?;
        Ok(StateSlot {
            table: Arc::clone(self),
            index: id.index as usize,
        })
    }

    fn check(&self, id: SlotId, expected: SlotNamespace) -> Result<(), SlotError> {
        if id.namespace != expected {
            return Err(SlotError::NamespaceMismatch {
                name: id.to_string(),
                expected,
                actual: id.namespace,
            });
        }
        if self.cell(id).is_none() {
            let capacity = match expected {
                SlotNamespace::Command => MAX_COMMAND_SLOTS,
                SlotNamespace::State => MAX_STATE_SLOTS,
            };
            return Err(SlotError::IndexOutOfRange {
                name: id.to_string(),
                index: id.index,
                capacity,
            });
        }
        Ok(())
    }
}

/// Controller-side accessor for one Command slot.
///
/// Reading returns the last value written (loop-back). Writing needs a
/// [`WriteGuard`] from the table's gate.
#[derive(Debug, Clone)]
pub struct CommandSlot {
    table: Arc<SlotTable>,
    index: usize,
}

impl CommandSlot {
    /// Slot position.
    pub fn id(&self) -> SlotId {
        SlotId::command(self.index as u16)
    }

    /// Last written value.
    #[inline]
    pub fn read(&self) -> f64 {
        f64::from_bits(self.table.commands[self.index].load(Ordering::Acquire))
    }

    /// Store `value`. The guard must come from this slot's table.
    #[inline]
    pub fn write(&self, guard: &WriteGuard<'_>, value: f64) {
        debug_assert!(guard.guards(&self.table.gate), "guard from another slot table");
        self.table.commands[self.index].store(value.to_bits(), Ordering::Release);
    }

    /// Gate of the owning table.
    pub fn gate(&self) -> &WriteGate {
        &self.table.gate
    }
}

/// Controller-side accessor for one State slot. Read-only.
#[derive(Debug, Clone)]
pub struct StateSlot {
    table: Arc<SlotTable>,
    index: usize,
}

impl StateSlot {
    /// Slot position.
    pub fn id(&self) -> SlotId {
        SlotId::state(self.index as u16)
    }

    /// Latest hardware value.
    #[inline]
    pub fn read(&self) -> f64 {
        f64::from_bits(self.table.states[self.index].load(Ordering::Acquire))
    }
}

/// Hardware-side view of the table.
///
/// Reads commands, publishes state, and resolves armed async-status slots.
#[derive(Debug, Clone)]
pub struct HardwarePort {
    table: Arc<SlotTable>,
}

impl HardwarePort {
    /// Port over a shared table.
    pub fn new(table: Arc<SlotTable>) -> Self {
        Self { table }
    }

    /// Current Command value; `None` outside the table.
    #[inline]
    pub fn command(&self, index: u16) -> Option<f64> {
        self.table.read(SlotId::command(index))
    }

    /// Current State value; `None` outside the table.
    #[inline]
    pub fn state(&self, index: u16) -> Option<f64> {
        self.table.read(SlotId::state(index))
    }

    /// Publish a State value. Returns `false` for an index outside the table.
    pub fn set_state(&self, index: u16, value: f64) -> bool {
        match self.table.states.get(index as usize) {
            Some(cell) => {
                cell.store(value.to_bits(), Ordering::Release);
                true
            }
            None => false,
        }
    }

    /// Answer a pending async command.
    ///
    /// Only replaces the value if the slot still holds [`ASYNC_WAITING`], so a
    /// late answer never overwrites a value the controller has since re-armed
    /// or reset. Returns whether the slot was resolved.
    pub fn resolve_async(&self, index: u16, status: AsyncStatus) -> bool {
        let Some(cell) = self.table.commands.get(index as usize) else {
            return false;
        };
        cell.compare_exchange(
            ASYNC_WAITING.to_bits(),
            status.value().to_bits(),
            Ordering::AcqRel,
            Ordering::Acquire,
        )
        .is_ok()
    }

    /// Whether the async-status slot at `index` is waiting for an answer.
    pub fn is_pending(&self, index: u16) -> bool {
        self.command(index) == Some(ASYNC_WAITING)
    }
}
