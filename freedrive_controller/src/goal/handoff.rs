//! Single-slot handoff of the active goal from the non-RT to the RT domain.
//!
//! Built on `arc_swap::ArcSwapOption`: the non-RT side replaces the slot
//! atomically, the RT side takes wait-free snapshots with [`GoalHandoff::peek`].
//! There is no history; a publish overwrites whatever was there.
//!
//! The RT side never frees a goal. Every published goal is also owned by the
//! goal registry until the monitor drains it, and the monitor only drains goals
//! that have left this slot while no RT update was running.

use arc_swap::{ArcSwapOption, Guard};
use std::sync::Arc;

use super::active::ActiveGoal;

/// Latest-value buffer for the active goal.
#[derive(Debug, Default)]
pub struct GoalHandoff {
    slot: ArcSwapOption<ActiveGoal>,
}

impl GoalHandoff {
    /// Empty buffer.
    pub fn new() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
        }
    }

    /// Replace the active goal, returning the previous one. Non-RT.
    pub fn publish(&self, goal: Arc<ActiveGoal>) -> Option<Arc<ActiveGoal>> {
        self.slot.swap(Some(goal))
    }

    /// Empty the buffer, returning the previous goal. Non-RT.
    pub fn clear(&self) -> Option<Arc<ActiveGoal>> {
        self.slot.swap(None)
    }

    /// Empty the buffer only if it still holds `goal`.
    ///
    /// Returns whether this call removed it. A goal published in the meantime
    /// is left untouched.
    pub fn clear_if(&self, goal: &ActiveGoal) -> bool {
        let current = self.slot.load();
        let holds = match &*current {
            Some(c) => std::ptr::eq(Arc::as_ptr(c), goal),
            None => false,
        };
        if !holds {
            return false;
        }
        let previous = self.slot.compare_and_swap(&current, None::<Arc<ActiveGoal>>);
        match &*previous {
            Some(p) => std::ptr::eq(Arc::as_ptr(p), goal),
            None => false,
        }
    }

    /// Wait-free snapshot for the RT side. No allocation.
    #[inline]
    pub fn peek(&self) -> Guard<Option<Arc<ActiveGoal>>> {
        self.slot.load()
    }

    /// Owning snapshot. Non-RT.
    pub fn current(&self) -> Option<Arc<ActiveGoal>> {
        self.slot.load_full()
    }

    /// Whether the buffer holds `goal`.
    pub fn holds(&self, goal: &ActiveGoal) -> bool {
        match &*self.slot.load() {
            Some(c) => std::ptr::eq(Arc::as_ptr(c), goal),
            None => false,
        }
    }
}
