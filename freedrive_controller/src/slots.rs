//! Slot bindings claimed by the freedrive controller.
//!
//! [`ResolvedSlots`] is produced at configure time from the host's registry
//! and holds only ids. [`FreedriveSlots`] is produced at activation by binding
//! those ids to the live slot table; its accessors are wait-free and are what
//! the RT update and the goal callbacks use.

use freedrive_common::goal::FreedriveRequest;
use freedrive_common::slots::{
    ASYNC_WAITING, CommandSlot, FLAG_OFF, FLAG_ON, OptionalSlots, SlotError, SlotId, SlotName,
    SlotNamespace, SlotRegistry, SlotTable, StateSlot, WriteGate, WriteGuard, decode_flag,
    encode_flag,
};
use std::sync::Arc;

use crate::command::AsyncCommand;

// ─── Configure time ─────────────────────────────────────────────────

/// Slot ids resolved from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSlots {
    prefix: String,
    async_success: SlotId,
    cmd: SlotId,
    initialized: SlotId,
    abort: Option<SlotId>,
    disable: Option<SlotId>,
}

impl ResolvedSlots {
    /// Resolve every role under `prefix`.
    ///
    /// Missing required roles and any namespace or encoding mismatch fail.
    /// A missing optional role is left unbound.
    pub fn resolve(registry: &SlotRegistry, prefix: &str) -> Result<Self, SlotError> {
        let optional = |name: SlotName| match registry.resolve(name, prefix) {
            Ok(id) => Ok(Some(id)),
            Err(SlotError::Missing { .. }) => Ok(None),
            Err(e) => Err(e),
        };
        Ok(Self {
            prefix: prefix.to_string(),
            async_success: registry.resolve(SlotName::FreedriveModeAsyncSuccess, prefix)?,
            cmd: registry.resolve(SlotName::FreedriveModeCmd, prefix)?,
            initialized: registry.resolve(SlotName::InitializedFlag, prefix)?,
            abort: optional(SlotName::Abort)?,
            disable: optional(SlotName::Disable)?,
        })
    }

    /// Optional roles that were found.
    pub fn optional(&self) -> OptionalSlots {
        let mut found = OptionalSlots::empty();
        found.set(OptionalSlots::ABORT, self.abort.is_some());
        found.set(OptionalSlots::DISABLE, self.disable.is_some());
        found
    }

    /// Fully-qualified names of the bound slots in `namespace`.
    pub fn names(&self, namespace: SlotNamespace) -> Vec<String> {
        SlotName::ALL
            .iter()
            .filter(|name| name.namespace() == namespace)
            .filter(|name| name.is_required() || self.optional().contains(OptionalSlots::for_name(**name)))
            .map(|name| name.qualified(&self.prefix))
            .collect()
    }

    /// Bind every resolved id to `table`.
    pub fn bind(&self, table: &Arc<SlotTable>) -> Result<FreedriveSlots, SlotError> {
        Ok(FreedriveSlots {
            async_success: table.command_slot(self.async_success)?,
            cmd: table.command_slot(self.cmd)?,
            initialized: table.state_slot(self.initialized)?,
            abort: self.abort.map(|id| table.command_slot(id)).transpose()?,
            disable: self.disable.map(|id| table.command_slot(id)).transpose()?,
        })
    }
}

// ─── Activation time ────────────────────────────────────────────────

/// Live accessors for the controller's slots.
#[derive(Debug)]
pub struct FreedriveSlots {
    async_success: CommandSlot,
    cmd: CommandSlot,
    initialized: StateSlot,
    abort: Option<CommandSlot>,
    disable: Option<CommandSlot>,
}

impl FreedriveSlots {
    /// Command write gate of the bound table.
    #[inline]
    pub fn gate(&self) -> &WriteGate {
        self.cmd.gate()
    }

    /// Handshake status slot.
    #[inline]
    pub fn async_success(&self) -> &CommandSlot {
        &self.async_success
    }

    /// Mode command slot.
    #[inline]
    pub fn cmd(&self) -> &CommandSlot {
        &self.cmd
    }

    /// Last commanded mode value.
    #[inline]
    pub fn mode(&self) -> f64 {
        self.cmd.read()
    }

    /// Hardware interface reports initialized.
    #[inline]
    pub fn hardware_ready(&self) -> bool {
        decode_flag(self.initialized.read())
    }

    /// Current handshake status value.
    #[inline]
    pub fn read_status(&self) -> f64 {
        self.async_success.read()
    }

    /// Optional roles that are bound.
    pub fn optional(&self) -> OptionalSlots {
        let mut bound = OptionalSlots::empty();
        bound.set(OptionalSlots::ABORT, self.abort.is_some());
        bound.set(OptionalSlots::DISABLE, self.disable.is_some());
        bound
    }

    /// Arm the handshake and write the mode change for `request`.
    ///
    /// Enabling writes 1.0 to the mode command. Disabling writes 0.0 and, when
    /// bound, raises the `DISABLE` trigger.
    pub fn issue(
        &self,
        guard: &WriteGuard<'_>,
        request: FreedriveRequest,
        max_retries: u32,
    ) -> AsyncCommand {
        let mode = encode_flag(request.enable);
        match (&self.disable, request.enable) {
            (Some(disable), false) => AsyncCommand::issue(
                guard,
                &self.async_success,
                ASYNC_WAITING,
                &[(&self.cmd, mode), (disable, FLAG_ON)],
                max_retries,
            ),
            _ => AsyncCommand::issue(
                guard,
                &self.async_success,
                ASYNC_WAITING,
                &[(&self.cmd, mode)],
                max_retries,
            ),
        }
    }

    /// Re-arm the handshake for a cancellation: mode 0.0 and, when bound, the
    /// `ABORT` trigger.
    pub fn issue_cancel(&self, guard: &WriteGuard<'_>, max_retries: u32) -> AsyncCommand {
        match &self.abort {
            Some(abort) => AsyncCommand::issue(
                guard,
                &self.async_success,
                ASYNC_WAITING,
                &[(&self.cmd, FLAG_OFF), (abort, FLAG_ON)],
                max_retries,
            ),
            None => AsyncCommand::issue(
                guard,
                &self.async_success,
                ASYNC_WAITING,
                &[(&self.cmd, FLAG_OFF)],
                max_retries,
            ),
        }
    }

    /// Drop the triggers and, unless `keep_mode`, return the mode to 0.0.
    pub fn release(&self, guard: &WriteGuard<'_>, keep_mode: bool) {
        if let Some(abort) = &self.abort {
            abort.write(guard, FLAG_OFF);
        }
        if let Some(disable) = &self.disable {
            disable.write(guard, FLAG_OFF);
        }
        if !keep_mode {
            self.cmd.write(guard, FLAG_OFF);
        }
    }

    /// Every controller-owned Command slot back to 0.0.
    pub fn reset(&self, guard: &WriteGuard<'_>) {
        self.release(guard, false);
        self.async_success.write(guard, FLAG_OFF);
    }
}
