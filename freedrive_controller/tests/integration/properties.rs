//! Integration test: controller-wide guarantees.
//!
//! - never more than one executing goal, even with concurrent submitters
//! - bounded handshake polling: N retries → at most N + 1 status reads
//! - goal cleanup runs once no matter how many paths end the goal

use freedrive_common::consts::MAXIMUM_RETRIES_MAX;
use freedrive_common::goal::{FreedriveRequest, GoalStatus, TerminalReason};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use super::common::{CMD, PERIOD, Rig};

#[test]
fn concurrent_submitters_leave_one_executing_goal() {
    let rig = Rig::retries(MAXIMUM_RETRIES_MAX);
    let Rig {
        controller,
        mut updater,
        reports,
        ..
    } = rig;
    let controller = Arc::new(controller);

    let stop = Arc::new(AtomicBool::new(false));
    let rt = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while !stop.load(Ordering::Acquire) {
                updater.update(Duration::ZERO, PERIOD);
                thread::sleep(Duration::from_micros(50));
            }
            updater
        })
    };

    let submitters: Vec<_> = (0..4)
        .map(|_| {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                (0..25)
                    .map(|i| {
                        let request = if i % 2 == 0 {
                            FreedriveRequest::ENABLE
                        } else {
                            FreedriveRequest::DISABLE
                        };
                        controller.submit(request).unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let goals: Vec<_> = submitters
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    stop.store(true, Ordering::Release);
    let _updater = rt.join().unwrap();

    let live: Vec<_> = goals
        .iter()
        .filter(|g| !g.status().is_terminal())
        .collect();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].status(), GoalStatus::Executing);

    for goal in goals.iter().filter(|g| g.status().is_terminal()) {
        assert_eq!(goal.reason(), Some(TerminalReason::Preempted));
    }

    controller.monitor().tick();
    let reported = reports.try_iter().count();
    assert!(reported <= goals.len() - 1);
}

#[test]
fn polling_stops_after_retry_budget() {
    for retries in [0u32, 1, 3, 7] {
        let mut rig = Rig::retries(retries);
        let goal = rig.controller.submit(FreedriveRequest::ENABLE).unwrap();
        for _ in 0..(retries + 5) {
            rig.update();
        }
        assert_eq!(goal.reason(), Some(TerminalReason::AsyncTimeout));
        assert_eq!(rig.updater.attempts(), Some(retries + 1));
        assert_eq!(rig.updater.counters().idle, 4);
    }
}

#[test]
fn goal_is_cleaned_up_once() {
    let mut rig = Rig::retries(10);
    let goal = rig.controller.submit(FreedriveRequest::ENABLE).unwrap();
    rig.confirm();
    rig.update();
    assert_eq!(goal.status(), GoalStatus::Succeeded);
    assert!(goal.is_ended());
    assert_eq!(rig.port.command(CMD), Some(1.0));

    // Further cycles, a cancel and a deactivate must not clean it up again.
    rig.update();
    rig.controller.cancel(goal.id());
    assert_eq!(rig.port.command(CMD), Some(1.0));

    let reports = rig.expect_reports(1);
    assert_eq!(reports[0].id, goal.id());
    rig.controller.on_deactivate().unwrap();
    assert!(rig.reports.try_recv().is_err());
    assert_eq!(goal.status(), GoalStatus::Succeeded);
}

#[test]
fn preempted_goal_is_reported_once() {
    let mut rig = Rig::retries(10);
    let first = rig.controller.submit(FreedriveRequest::ENABLE).unwrap();
    let second = rig.controller.submit(FreedriveRequest::ENABLE).unwrap();
    rig.update();
    assert_eq!(first.reason(), Some(TerminalReason::Preempted));

    let reports = rig.expect_reports(1);
    assert_eq!(reports[0].id, first.id());

    rig.controller.on_deactivate().unwrap();
    let report = rig.reports.try_recv().unwrap();
    assert_eq!(report.id, second.id());
    assert_eq!(report.result.reason, TerminalReason::ControllerInactive);
    assert!(rig.reports.try_recv().is_err());
}
