//! Integration test: handoff buffer under concurrent publish/peek.
//!
//! A writer thread publishes goals with increasing ids while a reader spins on
//! `peek`. The reader must only ever see fully constructed goals, in
//! non-decreasing id order, and must end on the last published goal.

use freedrive_common::goal::{FreedriveRequest, GoalId, GoalStatus};
use freedrive_controller::goal::{ActiveGoal, GoalHandoff};
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

fn goal(id: u64) -> Arc<ActiveGoal> {
    let request = if id % 2 == 0 {
        FreedriveRequest::ENABLE
    } else {
        FreedriveRequest::DISABLE
    };
    Arc::new(ActiveGoal::new(GoalId(id), request))
}

fn run_interleaving(publishes: u64, yield_every: u64, clear_every: u64) {
    let handoff = Arc::new(GoalHandoff::new());
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let handoff = Arc::clone(&handoff);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut last = 0u64;
            let mut seen = 0u64;
            loop {
                let finished = done.load(Ordering::Acquire);
                if let Some(goal) = &*handoff.peek() {
                    let id = goal.id().0;
                    assert!(id >= last, "id went backwards: {id} after {last}");
                    assert_eq!(goal.request().enable, id % 2 == 0, "torn goal {id}");
                    assert_eq!(goal.status(), GoalStatus::Pending);
                    last = id;
                    seen += 1;
                }
                if finished {
                    return (last, seen);
                }
            }
        })
    };

    for id in 1..=publishes {
        handoff.publish(goal(id));
        if clear_every > 0 && id % clear_every == 0 && id != publishes {
            handoff.clear();
        }
        if yield_every > 0 && id % yield_every == 0 {
            thread::yield_now();
        }
    }
    done.store(true, Ordering::Release);

    let (last, seen) = reader.join().unwrap();
    assert_eq!(last, publishes);
    assert!(seen >= 1);
    assert_eq!(handoff.current().map(|g| g.id()), Some(GoalId(publishes)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn reader_sees_monotonic_complete_goals(
        publishes in 1u64..400,
        yield_every in 0u64..8,
        clear_every in 0u64..16,
    ) {
        run_interleaving(publishes, yield_every, clear_every);
    }
}

#[test]
fn overwrite_keeps_only_latest() {
    let handoff = GoalHandoff::new();
    let first = goal(1);
    assert!(handoff.publish(Arc::clone(&first)).is_none());
    let replaced = handoff.publish(goal(2)).unwrap();
    assert_eq!(replaced.id(), GoalId(1));
    assert!(!handoff.holds(&first));
    assert!(!handoff.clear_if(&first));
    assert_eq!(handoff.current().unwrap().id(), GoalId(2));
}
