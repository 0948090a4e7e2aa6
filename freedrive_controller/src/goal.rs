//! Goal lifecycle, handoff and ownership.
//!
//! - `machine`: pure transition table
//! - `active`: the shared, atomically updated goal record
//! - `handoff`: lock-free latest-value buffer from non-RT to RT
//! - `registry`: owning list drained by the monitor

pub mod active;
pub mod handoff;
pub mod machine;
pub mod registry;

pub use active::ActiveGoal;
pub use handoff::GoalHandoff;
pub use machine::{GoalEvent, GoalStateMachine, GoalTransition};
pub use registry::GoalRegistry;

use freedrive_common::goal::GoalStatus;
use freedrive_common::slots::WriteGuard;

use crate::slots::FreedriveSlots;

/// One-time cleanup of a goal that has reached a terminal status.
///
/// Clears the handoff buffer if it still holds `goal`, resets the trigger
/// slots and, unless the goal succeeded, puts the mode command back to its
/// safe value. Later calls for the same goal do nothing and return `false`.
/// Never allocates or frees, so the RT update may call it.
pub(crate) fn end_goal(
    goal: &ActiveGoal,
    slots: &FreedriveSlots,
    handoff: &GoalHandoff,
    guard: &WriteGuard<'_>,
) -> bool {
    if !goal.begin_end() {
        return false;
    }
    handoff.clear_if(goal);
    slots.release(guard, goal.status() == GoalStatus::Succeeded);
    goal.mark_released();
    true
}

/// Cleanup for a goal that ended while no slots were bound.
pub(crate) fn release_unbound(goal: &ActiveGoal, handoff: &GoalHandoff) -> bool {
    if !goal.begin_end() {
        return false;
    }
    handoff.clear_if(goal);
    goal.mark_released();
    true
}
