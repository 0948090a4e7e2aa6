//! Periodic update, called once per control cycle on the RT thread.
//!
//! Never blocks, allocates, frees or logs. The only shared-state accesses are
//! a wait-free handoff snapshot, atomic loads/stores on the goal and the
//! slots, and a single non-waiting attempt on the write gate.

use freedrive_common::goal::{GoalId, GoalStatus, TerminalReason};
use freedrive_common::slots::FLAG_ON;
use static_assertions::assert_impl_all;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::command::{AsyncCommand, AsyncPoll};
use crate::controller::Shared;
use crate::goal::{ActiveGoal, GoalEvent, GoalTransition, end_goal};
use crate::slots::FreedriveSlots;

/// Outcome of one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    /// Cycle completed (including idle cycles).
    Ok,
    /// Write gate held by a goal callback; this cycle's work was skipped.
    Deferred,
}

/// Per-updater diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateCounters {
    /// Total updates.
    pub cycles: u64,
    /// Updates with no live goal.
    pub idle: u64,
    /// Updates skipped on a busy gate.
    pub deferred: u64,
    /// Goals this updater brought to a terminal status.
    pub completed: u64,
}

/// Polling session bound to one goal.
#[derive(Debug, Clone, Copy)]
struct Session {
    goal: GoalId,
    command: AsyncCommand,
    canceling: bool,
}

/// RT side of the controller, handed out by `on_activate`.
pub struct FreedriveUpdater {
    shared: Arc<Shared>,
    slots: Arc<FreedriveSlots>,
    max_retries: u32,
    session: Option<Session>,
    counters: UpdateCounters,
}

assert_impl_all!(FreedriveUpdater: Send);

impl fmt::Debug for FreedriveUpdater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FreedriveUpdater")
            .field("max_retries", &self.max_retries)
            .field("session", &self.session)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

impl FreedriveUpdater {
    pub(crate) fn new(shared: Arc<Shared>, slots: Arc<FreedriveSlots>, max_retries: u32) -> Self {
        Self {
            shared,
            slots,
            max_retries,
            session: None,
            counters: UpdateCounters::default(),
        }
    }

    /// Advance the active goal by one control cycle.
    ///
    /// Order: handoff snapshot, write gate, session adoption, hardware check,
    /// cancellation, one handshake poll, terminal transition and cleanup.
    pub fn update(&mut self, _time: Duration, _period: Duration) -> UpdateStatus {
        self.shared.rt_enter();
        let status = self.cycle();
        self.shared.rt_exit();
        status
    }

    fn cycle(&mut self) -> UpdateStatus {
        self.counters.cycles += 1;
        if !self.shared.is_active() {
            self.counters.idle += 1;
            return UpdateStatus::Ok;
        }

        let snapshot = self.shared.handoff.peek();
        match (*snapshot).as_ref() {
            Some(goal) if !goal.status().is_terminal() => self.drive(goal),
            _ => {
                self.counters.idle += 1;
                UpdateStatus::Ok
            }
        }
    }

    /// Work on `goal`, a handoff snapshot taken before the gate was tried.
    ///
    /// A goal callback may preempt the goal and publish a new one between the
    /// snapshot and the gate, so the goal is checked again once the gate is
    /// held and left alone if it is no longer the published, live goal.
    fn drive(&mut self, goal: &ActiveGoal) -> UpdateStatus {
        let Self {
            shared,
            slots,
            max_retries,
            session,
            counters,
        } = self;
        let (shared, slots, max_retries): (&Shared, &FreedriveSlots, u32) =
            (shared, slots, *max_retries);

        let Some(guard) = slots.gate().try_rt() else {
            counters.deferred += 1;
            return UpdateStatus::Deferred;
        };
        if goal.status().is_terminal() || !shared.handoff.holds(goal) {
            counters.idle += 1;
            return UpdateStatus::Ok;
        }

        if session.is_none_or(|s| s.goal != goal.id()) {
            *session = None;
        }
        let current = session.get_or_insert(Session {
            goal: goal.id(),
            command: AsyncCommand::waiting(max_retries),
            canceling: false,
        });

        let event = if !slots.hardware_ready() {
            Some(GoalEvent::Abort(TerminalReason::HardwareNotReady))
        } else if goal.cancel_requested() && !current.canceling {
            current.command = slots.issue_cancel(&guard, max_retries);
            current.canceling = true;
            None
        } else {
            match current.command.poll(|| slots.read_status()) {
                AsyncPoll::Pending => None,
                AsyncPoll::Resolved(value) if value == FLAG_ON => Some(if current.canceling {
                    GoalEvent::CancelConfirmed
                } else {
                    GoalEvent::Confirm
                }),
                AsyncPoll::Resolved(_) => Some(GoalEvent::Abort(TerminalReason::HardwareRejected)),
                AsyncPoll::TimedOut => Some(GoalEvent::Abort(TerminalReason::AsyncTimeout)),
            }
        };

        if let Some(event) = event {
            if let GoalTransition::Ok(status) = goal.apply(event) {
                counters.completed += 1;
                record_mode(&shared.freedrive_active, goal, status);
            }
            end_goal(goal, slots, &shared.handoff, &guard);
        }
        UpdateStatus::Ok
    }

    /// Diagnostics snapshot.
    pub fn counters(&self) -> UpdateCounters {
        self.counters
    }

    /// Pending reads of the current handshake, if a goal is being polled.
    pub fn attempts(&self) -> Option<u32> {
        self.session.map(|s| s.command.attempts())
    }
}

#[inline]
fn record_mode(freedrive_active: &AtomicBool, goal: &ActiveGoal, status: GoalStatus) {
    match status {
        GoalStatus::Succeeded => freedrive_active.store(goal.request().enable, Ordering::Release),
        GoalStatus::Canceled => freedrive_active.store(false, Ordering::Release),
        _ => {}
    }
}
