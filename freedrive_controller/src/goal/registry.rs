//! Owning list of goals awaiting their result report. Non-RT only.

use freedrive_common::goal::GoalId;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::active::ActiveGoal;

/// Goals accepted but not yet reported to the channel.
#[derive(Debug, Default)]
pub struct GoalRegistry {
    goals: Mutex<Vec<Arc<ActiveGoal>>>,
}

impl GoalRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<ActiveGoal>>> {
        self.goals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Keep an owning reference until the goal is drained.
    pub fn register(&self, goal: Arc<ActiveGoal>) {
        self.lock().push(goal);
    }

    /// Find a registered goal.
    pub fn find(&self, id: GoalId) -> Option<Arc<ActiveGoal>> {
        self.lock().iter().find(|g| g.id() == id).cloned()
    }

    /// Non-terminal goals.
    pub fn in_flight(&self) -> Vec<Arc<ActiveGoal>> {
        self.lock()
            .iter()
            .filter(|g| !g.status().is_terminal())
            .cloned()
            .collect()
    }

    /// Goals whose cleanup has not finished, terminal or not.
    pub fn unreleased(&self) -> Vec<Arc<ActiveGoal>> {
        self.lock()
            .iter()
            .filter(|g| !g.is_released())
            .cloned()
            .collect()
    }

    /// Remove and return every goal whose cleanup has finished.
    ///
    /// `rt_quiescent` is consulted after the candidates are chosen; when it
    /// reports an RT update in progress nothing is removed, since that update
    /// may still hold a snapshot of one of them. A goal is returned by exactly
    /// one call.
    pub fn drain_finished(&self, rt_quiescent: impl FnOnce() -> bool) -> Vec<Arc<ActiveGoal>> {
        let mut goals = self.lock();
        let ready: Vec<bool> = goals
            .iter()
            .map(|g| g.status().is_terminal() && g.is_released())
            .collect();
        if !ready.contains(&true) || !rt_quiescent() {
            return Vec::new();
        }

        let mut ready = ready.into_iter();
        let mut finished = Vec::new();
        goals.retain(|g| {
            if ready.next().unwrap_or(false) {
                finished.push(Arc::clone(g));
                false
            } else {
                true
            }
        });
        finished
    }

    /// Goals whose cleanup has finished but which are not drained yet.
    pub fn finished(&self) -> usize {
        self.lock()
            .iter()
            .filter(|g| g.status().is_terminal() && g.is_released())
            .count()
    }

    /// Number of registered goals.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing awaits a report.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
