//! Integration test: end-to-end goal scenarios against a scripted hardware side.
//!
//! - hardware answers before the first cycle: Succeeded in one update
//! - hardware never answers: Aborted right after the last permitted retry
//! - a second goal preempts the executing one
//! - cancel completes only once the disable path is confirmed

use freedrive_common::goal::{CancelResponse, FreedriveRequest, GoalStatus, TerminalReason};
use freedrive_common::slots::ASYNC_WAITING;

use super::common::{ABORT, CMD, DISABLE, Rig, STATUS};

// ── Immediate confirmation ──────────────────────────────────────────

#[test]
fn immediate_confirmation_succeeds_in_one_cycle() {
    let mut rig = Rig::retries(10);
    let goal = rig.controller.submit(FreedriveRequest::ENABLE).unwrap();
    assert_eq!(goal.status(), GoalStatus::Executing);
    assert_eq!(rig.port.command(CMD), Some(1.0));

    assert!(rig.confirm());
    rig.update();

    assert_eq!(goal.status(), GoalStatus::Succeeded);
    assert_eq!(goal.reason(), Some(TerminalReason::Confirmed));
    assert_eq!(rig.port.command(CMD), Some(1.0));
    assert!(rig.controller.is_freedrive_active());

    let reports = rig.expect_reports(1);
    assert_eq!(reports[0].id, goal.id());
    assert!(reports[0].result.succeeded());
}

// ── Retry exhaustion ────────────────────────────────────────────────

#[test]
fn unanswered_handshake_aborts_after_last_retry() {
    const RETRIES: u32 = 4;
    let mut rig = Rig::retries(RETRIES);
    let goal = rig.controller.submit(FreedriveRequest::ENABLE).unwrap();

    for cycle in 1..=RETRIES {
        rig.update();
        assert_eq!(goal.status(), GoalStatus::Executing, "cycle {cycle}");
        assert_eq!(rig.updater.attempts(), Some(cycle));
    }

    rig.update();
    assert_eq!(goal.status(), GoalStatus::Aborted);
    assert_eq!(goal.reason(), Some(TerminalReason::AsyncTimeout));
    assert_eq!(rig.port.command(CMD), Some(0.0));

    let reports = rig.expect_reports(1);
    assert!(!reports[0].result.succeeded());
    assert_eq!(reports[0].result.reason, TerminalReason::AsyncTimeout);
}

#[test]
fn zero_retries_abort_on_first_pending_cycle() {
    let mut rig = Rig::retries(0);
    let goal = rig.controller.submit(FreedriveRequest::ENABLE).unwrap();
    rig.update();
    assert_eq!(goal.reason(), Some(TerminalReason::AsyncTimeout));
}

// ── Preemption ──────────────────────────────────────────────────────

#[test]
fn second_goal_preempts_first() {
    let mut rig = Rig::retries(10);
    let first = rig.controller.submit(FreedriveRequest::ENABLE).unwrap();
    rig.update();
    assert_eq!(first.status(), GoalStatus::Executing);

    let second = rig.controller.submit(FreedriveRequest::DISABLE).unwrap();
    assert_eq!(first.status(), GoalStatus::Aborted);
    assert_eq!(first.reason(), Some(TerminalReason::Preempted));
    assert_eq!(second.status(), GoalStatus::Executing);
    assert_eq!(rig.port.command(CMD), Some(0.0));
    assert_eq!(rig.port.command(DISABLE), Some(1.0));
    assert!(rig.port.is_pending(STATUS));

    // The cycle now polls the second goal from a fresh session.
    rig.update();
    assert_eq!(rig.updater.attempts(), Some(1));
    assert!(rig.confirm());
    rig.update();
    assert_eq!(second.status(), GoalStatus::Succeeded);
    assert_eq!(rig.port.command(DISABLE), Some(0.0));
    assert!(!rig.controller.is_freedrive_active());

    let mut reports = rig.expect_reports(2);
    reports.sort_by_key(|r| r.id);
    assert_eq!(reports[0].result.reason, TerminalReason::Preempted);
    assert_eq!(reports[1].result.reason, TerminalReason::Confirmed);
}

// ── Cancellation ────────────────────────────────────────────────────

#[test]
fn cancel_waits_for_disable_confirmation() {
    let mut rig = Rig::retries(10);
    let goal = rig.controller.submit(FreedriveRequest::ENABLE).unwrap();
    rig.update();

    assert_eq!(rig.controller.cancel(goal.id()), CancelResponse::Accept);
    assert_eq!(goal.status(), GoalStatus::Executing);

    rig.update();
    assert_eq!(goal.status(), GoalStatus::Executing);
    assert_eq!(rig.port.command(STATUS), Some(ASYNC_WAITING));
    assert_eq!(rig.port.command(CMD), Some(0.0));
    assert_eq!(rig.port.command(ABORT), Some(1.0));

    rig.update();
    assert_eq!(goal.status(), GoalStatus::Executing);

    assert!(rig.confirm());
    rig.update();
    assert_eq!(goal.status(), GoalStatus::Canceled);
    assert_eq!(goal.reason(), Some(TerminalReason::CancelRequested));
    assert_eq!(rig.port.command(ABORT), Some(0.0));
    assert!(!rig.controller.is_freedrive_active());

    let reports = rig.expect_reports(1);
    assert_eq!(reports[0].result.status, GoalStatus::Canceled);
}

#[test]
fn cancel_of_finished_goal_rejected() {
    let mut rig = Rig::retries(10);
    let goal = rig.controller.submit(FreedriveRequest::ENABLE).unwrap();
    rig.confirm();
    rig.update();
    assert_eq!(rig.controller.cancel(goal.id()), CancelResponse::Reject);
}

#[test]
fn hardware_refusal_aborts() {
    let mut rig = Rig::retries(10);
    let goal = rig.controller.submit(FreedriveRequest::ENABLE).unwrap();
    assert!(rig.refuse());
    rig.update();
    assert_eq!(goal.reason(), Some(TerminalReason::HardwareRejected));
    assert_eq!(rig.port.command(CMD), Some(0.0));
}
