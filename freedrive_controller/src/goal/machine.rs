//! Goal lifecycle transitions.
//!
//! `Pending → Accepted → Executing → {Succeeded, Canceled, Aborted}`.
//! Abort is reachable from every non-terminal status; terminal statuses accept
//! no event. The table is pure so it can be applied with a CAS loop on the
//! shared goal word (see [`super::ActiveGoal`]).

use freedrive_common::goal::{GoalStatus, TerminalReason};

/// Result of a goal transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalTransition {
    /// Transition succeeded, new status.
    Ok(GoalStatus),
    /// Transition rejected, reason.
    Rejected(&'static str),
}

/// Event that can move a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalEvent {
    /// `goal_accepted` took the goal.
    Accept,
    /// Hardware command issued.
    Execute,
    /// Hardware confirmed the request.
    Confirm,
    /// Hardware confirmed the cancellation.
    CancelConfirmed,
    /// Goal ended without success.
    Abort(TerminalReason),
}

impl GoalEvent {
    /// Reason recorded when this event ends a goal.
    pub const fn terminal_reason(self) -> Option<TerminalReason> {
        match self {
            Self::Confirm => Some(TerminalReason::Confirmed),
            Self::CancelConfirmed => Some(TerminalReason::CancelRequested),
            Self::Abort(reason) => Some(reason),
            Self::Accept | Self::Execute => None,
        }
    }
}

/// Goal transition table.
pub struct GoalStateMachine;

impl GoalStateMachine {
    /// Next status for `event` in `status`.
    pub const fn handle_event(status: GoalStatus, event: GoalEvent) -> GoalTransition {
        use GoalEvent::*;
        use GoalStatus::*;

        let next = match (status, event) {
            (Pending, Accept) => Accepted,
            (Accepted, Execute) => Executing,
            (Executing, Confirm) => Succeeded,
            (Executing, CancelConfirmed) => Canceled,
            (Pending | Accepted | Executing, Abort(_)) => Aborted,
            (Succeeded | Canceled | Aborted, _) => {
                return GoalTransition::Rejected("goal already terminal");
            }
            (Pending, _) => return GoalTransition::Rejected("goal not accepted yet"),
            (Accepted, _) => return GoalTransition::Rejected("hardware command not issued"),
            (Executing, _) => return GoalTransition::Rejected("goal already executing"),
        };
        GoalTransition::Ok(next)
    }
}
