//! Shared goal record.
//!
//! Status and terminal reason live in one `AtomicU16` so a terminal
//! transition and its reason become visible together, and two racing
//! finishers (RT confirmation vs. host preemption) cannot mix their reasons.

use freedrive_common::goal::{FreedriveRequest, GoalId, GoalResult, GoalStatus, TerminalReason};
use static_assertions::const_assert;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use super::machine::{GoalEvent, GoalStateMachine, GoalTransition};

const NO_REASON: u8 = 0xFF;

const_assert!((TerminalReason::ControllerInactive as u8) < NO_REASON);

#[inline]
const fn pack(status: GoalStatus, reason: Option<TerminalReason>) -> u16 {
    let r = match reason {
        Some(r) => r as u8,
        None => NO_REASON,
    };
    ((r as u16) << 8) | status as u16
}

#[inline]
fn unpack(word: u16) -> (GoalStatus, Option<TerminalReason>) {
    let status = GoalStatus::from_u8((word & 0xFF) as u8).unwrap_or(GoalStatus::Aborted);
    (status, TerminalReason::from_u8((word >> 8) as u8))
}

/// A goal as seen by every domain: callbacks, RT update and monitor.
#[derive(Debug)]
pub struct ActiveGoal {
    id: GoalId,
    request: FreedriveRequest,
    word: AtomicU16,
    cancel_requested: AtomicBool,
    ended: AtomicBool,
    released: AtomicBool,
}

impl ActiveGoal {
    /// New goal in `Pending`.
    pub fn new(id: GoalId, request: FreedriveRequest) -> Self {
        Self {
            id,
            request,
            word: AtomicU16::new(pack(GoalStatus::Pending, None)),
            cancel_requested: AtomicBool::new(false),
            ended: AtomicBool::new(false),
            released: AtomicBool::new(false),
        }
    }

    /// Goal identifier.
    #[inline]
    pub fn id(&self) -> GoalId {
        self.id
    }

    /// Goal payload.
    #[inline]
    pub fn request(&self) -> FreedriveRequest {
        self.request
    }

    /// Current status.
    #[inline]
    pub fn status(&self) -> GoalStatus {
        unpack(self.word.load(Ordering::Acquire)).0
    }

    /// Terminal reason, once terminal.
    #[inline]
    pub fn reason(&self) -> Option<TerminalReason> {
        unpack(self.word.load(Ordering::Acquire)).1
    }

    /// Apply `event` atomically. Never blocks.
    pub fn apply(&self, event: GoalEvent) -> GoalTransition {
        let mut current = self.word.load(Ordering::Acquire);
        loop {
            let (status, _) = unpack(current);
            let next = match GoalStateMachine::handle_event(status, event) {
                GoalTransition::Ok(next) => next,
                rejected => return rejected,
            };
            let reason = if next.is_terminal() {
                event.terminal_reason()
            } else {
                None
            };
            match self.word.compare_exchange_weak(
                current,
                pack(next, reason),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return GoalTransition::Ok(next),
                Err(actual) => current = actual,
            }
        }
    }

    /// Ask the RT side to cancel. `false` once the goal is terminal.
    pub fn request_cancel(&self) -> bool {
        if self.status().is_terminal() {
            return false;
        }
        self.cancel_requested.store(true, Ordering::Release);
        true
    }

    /// Cancellation has been requested.
    #[inline]
    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::Acquire)
    }

    /// Outcome for the client, once terminal.
    pub fn result(&self) -> Option<GoalResult> {
        let (status, reason) = unpack(self.word.load(Ordering::Acquire));
        match (status.is_terminal(), reason) {
            (true, Some(reason)) => Some(GoalResult::new(status, reason)),
            _ => None,
        }
    }

    /// Claim the one-time cleanup. Only the first caller gets `true`.
    #[inline]
    pub(crate) fn begin_end(&self) -> bool {
        !self.ended.swap(true, Ordering::AcqRel)
    }

    /// Cleanup has run.
    #[inline]
    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }

    /// Cleanup finished; the handoff buffer no longer references this goal.
    #[inline]
    pub(crate) fn mark_released(&self) {
        self.released.store(true, Ordering::Release);
    }

    /// Safe to drop the last owning reference.
    #[inline]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}
