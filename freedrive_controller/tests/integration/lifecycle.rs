//! Integration test: lifecycle hook ordering and interface claims.

use freedrive_common::goal::{
    CancelResponse, FreedriveRequest, GoalStatus, RejectReason, TerminalReason,
};
use freedrive_common::slots::{HardwarePort, SlotId, SlotLayout, SlotRegistry, SlotTable};
use freedrive_controller::{
    ControllerError, FreedriveController, FreedriveParams, LifecycleState, NullChannel,
};
use std::sync::Arc;

use super::common::{ABORT, CMD, DISABLE, Rig, STATUS};

fn registry(prefix: &str) -> SlotRegistry {
    SlotRegistry::from_layout(&SlotLayout::robot_default(prefix)).unwrap()
}

#[test]
fn full_lifecycle_round_trip() {
    let mut controller = FreedriveController::new(Arc::new(NullChannel));
    controller.on_init().unwrap();
    assert_eq!(controller.lifecycle_state(), LifecycleState::Unconfigured);

    controller
        .on_configure(FreedriveParams::default(), &registry(""))
        .unwrap();
    assert_eq!(controller.lifecycle_state(), LifecycleState::Inactive);

    let table = SlotTable::shared();
    let _updater = controller.on_activate(&table).unwrap();
    assert_eq!(controller.lifecycle_state(), LifecycleState::Active);

    controller.on_deactivate().unwrap();
    assert_eq!(controller.lifecycle_state(), LifecycleState::Inactive);

    controller.on_cleanup().unwrap();
    assert_eq!(controller.lifecycle_state(), LifecycleState::Unconfigured);
    assert!(controller.command_interface_configuration().is_empty());

    // Reconfigure with different parameters and activate again.
    let params = FreedriveParams {
        maximum_retries: 3,
        tf_prefix: "arm_".to_string(),
        ..Default::default()
    };
    controller.on_configure(params, &registry("arm_")).unwrap();
    assert_eq!(controller.params().maximum_retries, 3);
    let _updater = controller.on_activate(&table).unwrap();

    controller.on_shutdown().unwrap();
    assert_eq!(controller.lifecycle_state(), LifecycleState::Finalized);
}

#[test]
fn out_of_order_hooks_are_rejected() {
    let mut controller = FreedriveController::new(Arc::new(NullChannel));
    assert!(matches!(
        controller.on_deactivate(),
        Err(ControllerError::InvalidTransition {
            from: LifecycleState::Unconfigured,
            hook: "on_deactivate"
        })
    ));
    assert!(controller.on_cleanup().is_err());

    controller
        .on_configure(FreedriveParams::default(), &registry(""))
        .unwrap();
    assert!(matches!(
        controller.on_configure(FreedriveParams::default(), &registry("")),
        Err(ControllerError::InvalidTransition {
            from: LifecycleState::Inactive,
            ..
        })
    ));

    let _updater = controller.on_activate(&SlotTable::shared()).unwrap();
    assert!(controller.on_cleanup().is_err());
    assert!(controller.on_activate(&SlotTable::shared()).is_err());
    assert_eq!(controller.lifecycle_state(), LifecycleState::Active);
    controller.on_deactivate().unwrap();
}

#[test]
fn prefixed_interfaces_are_claimed() {
    let mut controller = FreedriveController::new(Arc::new(NullChannel));
    let params = FreedriveParams {
        tf_prefix: "ur5e_".to_string(),
        ..Default::default()
    };
    controller.on_configure(params, &registry("ur5e_")).unwrap();

    let commands = controller.command_interface_configuration();
    assert!(commands.contains(&"ur5e_freedrive_mode/async_success".to_string()));
    assert!(commands.contains(&"ur5e_freedrive_mode/enable".to_string()));
    assert!(commands.contains(&"ur5e_freedrive_mode/abort".to_string()));
    assert!(commands.contains(&"ur5e_freedrive_mode/disable".to_string()));
    assert_eq!(
        controller.state_interface_configuration(),
        vec!["ur5e_system_interface/initialized".to_string()]
    );
}

#[test]
fn prefix_mismatch_fails_configure() {
    let mut controller = FreedriveController::new(Arc::new(NullChannel));
    let params = FreedriveParams {
        tf_prefix: "left_".to_string(),
        ..Default::default()
    };
    let err = controller.on_configure(params, &registry("right_")).unwrap_err();
    assert!(matches!(err, ControllerError::Slot(_)));
    assert_eq!(controller.lifecycle_state(), LifecycleState::Unconfigured);
}

#[test]
fn missing_optional_slots_still_configure() {
    let layout = SlotLayout::robot_default("")
        .without("freedrive_mode/abort")
        .without("freedrive_mode/disable");
    let mut rig = Rig::with_layout(FreedriveParams::default(), layout);
    assert_eq!(rig.controller.command_interface_configuration().len(), 2);

    let goal = rig.controller.submit(FreedriveRequest::ENABLE).unwrap();
    rig.update();
    assert_eq!(rig.controller.cancel(goal.id()), CancelResponse::Accept);
    rig.update();
    assert_eq!(rig.port.command(CMD), Some(0.0));
    assert_eq!(rig.port.command(ABORT), Some(0.0));
    assert_eq!(rig.port.command(DISABLE), Some(0.0));
    assert!(rig.port.is_pending(STATUS));

    rig.confirm();
    rig.update();
    assert_eq!(goal.status(), GoalStatus::Canceled);
}

#[test]
fn deactivate_aborts_in_flight_goal_and_resets_slots() {
    let mut rig = Rig::retries(10);
    let goal = rig.controller.submit(FreedriveRequest::ENABLE).unwrap();
    rig.update();
    assert!(rig.port.is_pending(STATUS));

    rig.controller.on_deactivate().unwrap();
    assert_eq!(goal.status(), GoalStatus::Aborted);
    assert_eq!(goal.reason(), Some(TerminalReason::ControllerInactive));
    for index in [STATUS, CMD, ABORT, DISABLE] {
        assert_eq!(rig.table.read(SlotId::command(index)), Some(0.0));
    }
    let report = rig.reports.try_recv().unwrap();
    assert_eq!(report.id, goal.id());

    // Inactive controller: updates idle, submissions rejected.
    rig.update();
    assert_eq!(rig.port.command(CMD), Some(0.0));
    assert_eq!(
        rig.controller.submit(FreedriveRequest::ENABLE).unwrap_err(),
        RejectReason::ControllerInactive
    );
}

#[test]
fn reactivation_starts_from_safe_slots() {
    let mut rig = Rig::retries(10);
    rig.controller.submit(FreedriveRequest::ENABLE).unwrap();
    rig.confirm();
    rig.update();
    assert!(rig.controller.is_freedrive_active());
    assert_eq!(rig.port.command(CMD), Some(1.0));

    rig.controller.on_deactivate().unwrap();
    assert!(!rig.controller.is_freedrive_active());
    let mut updater = rig.controller.on_activate(&rig.table).unwrap();
    assert_eq!(rig.port.command(CMD), Some(0.0));

    HardwarePort::new(Arc::clone(&rig.table)).set_state(0, 1.0);
    let goal = rig.controller.submit(FreedriveRequest::ENABLE).unwrap();
    rig.confirm();
    updater.update(std::time::Duration::ZERO, super::common::PERIOD);
    assert_eq!(goal.status(), GoalStatus::Succeeded);
    rig.controller.on_deactivate().unwrap();
}
