//! Result delivery to the requesting client.
//!
//! The monitor hands every finished goal to a [`GoalChannel`] exactly once.
//! Implementations run on the monitor thread and must not block for long.

use crossbeam_channel::{Receiver, Sender, unbounded};
use freedrive_common::goal::{GoalId, GoalReport, GoalResult};
use tracing::debug;

/// Sink for terminal goal results.
pub trait GoalChannel: Send + Sync {
    /// Deliver the final result of `id`.
    fn on_terminal(&self, id: GoalId, result: &GoalResult);
}

/// Forwards results as [`GoalReport`]s over a crossbeam channel.
#[derive(Debug, Clone)]
pub struct ReportChannel {
    tx: Sender<GoalReport>,
}

impl ReportChannel {
    /// Channel plus the receiving end for the client.
    pub fn unbounded() -> (Self, Receiver<GoalReport>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }
}

impl GoalChannel for ReportChannel {
    fn on_terminal(&self, id: GoalId, result: &GoalResult) {
        let report = GoalReport {
            id,
            result: result.clone(),
        };
        if self.tx.send(report).is_err() {
            debug!("{id}: report receiver dropped");
        }
    }
}

/// Discards results.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullChannel;

impl GoalChannel for NullChannel {
    fn on_terminal(&self, _id: GoalId, _result: &GoalResult) {}
}
