//! Integration test: hardware interface losing initialization.

use freedrive_common::consts::INITIALIZED_FLAG_INDEX;
use freedrive_common::goal::{FreedriveRequest, GoalStatus, RejectReason, TerminalReason};
use freedrive_controller::UpdateStatus;
use std::time::Duration;

use super::common::{CMD, PERIOD, Rig};

#[test]
fn lost_initialization_aborts_executing_goal() {
    let mut rig = Rig::retries(10);
    let goal = rig.controller.submit(FreedriveRequest::ENABLE).unwrap();
    rig.update();
    assert_eq!(goal.status(), GoalStatus::Executing);

    rig.port.set_state(INITIALIZED_FLAG_INDEX, 0.0);
    rig.update();
    assert_eq!(goal.status(), GoalStatus::Aborted);
    assert_eq!(goal.reason(), Some(TerminalReason::HardwareNotReady));
    assert_eq!(rig.port.command(CMD), Some(0.0));

    let reports = rig.expect_reports(1);
    assert_eq!(reports[0].result.reason, TerminalReason::HardwareNotReady);
}

#[test]
fn uninitialized_hardware_rejects_new_goals() {
    let rig = Rig::retries(10);
    rig.port.set_state(INITIALIZED_FLAG_INDEX, 0.0);
    assert_eq!(
        rig.controller.submit(FreedriveRequest::ENABLE).unwrap_err(),
        RejectReason::HardwareNotReady
    );
    assert_eq!(rig.port.command(CMD), Some(0.0));
}

#[test]
fn confirmed_mode_survives_later_loss() {
    let mut rig = Rig::retries(10);
    let goal = rig.controller.submit(FreedriveRequest::ENABLE).unwrap();
    rig.confirm();
    rig.update();
    assert_eq!(goal.status(), GoalStatus::Succeeded);

    // No live goal: the cycle leaves the slots alone.
    rig.port.set_state(INITIALIZED_FLAG_INDEX, 0.0);
    rig.update();
    assert_eq!(goal.status(), GoalStatus::Succeeded);
    assert_eq!(rig.port.command(CMD), Some(1.0));
}

#[test]
fn held_gate_defers_cycle() {
    let mut rig = Rig::retries(0);
    let goal = rig.controller.submit(FreedriveRequest::ENABLE).unwrap();

    let host = rig.table.gate().lock_host();
    assert_eq!(
        rig.updater.update(Duration::ZERO, PERIOD),
        UpdateStatus::Deferred
    );
    drop(host);
    assert_eq!(goal.status(), GoalStatus::Executing);
    assert_eq!(rig.updater.counters().deferred, 1);

    assert_eq!(rig.updater.update(Duration::ZERO, PERIOD), UpdateStatus::Ok);
    assert_eq!(goal.reason(), Some(TerminalReason::AsyncTimeout));
}
