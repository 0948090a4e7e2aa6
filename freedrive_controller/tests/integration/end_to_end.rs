//! Integration test: controller against the simulation driver.
//!
//! Stepped tests interleave one hardware cycle with one controller cycle for
//! determinism. The threaded test runs `HalCore::run` and `CycleRunner::run`
//! on their own threads, as the binary does.

use freedrive_common::goal::{FreedriveRequest, GoalStatus, RejectReason, TerminalReason};
use freedrive_common::slots::{SlotRegistry, SlotTable};
use freedrive_controller::cycle::CycleRunner;
use freedrive_controller::goal::ActiveGoal;
use freedrive_controller::{
    ControllerConfig, FreedriveController, FreedriveUpdater, ReportChannel,
};
use freedrive_hal::{DriverRegistry, HalCore, HardwareLayout, SimulationConfig};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use super::common::PERIOD;

struct Bench {
    hal: HalCore,
    controller: FreedriveController,
    updater: FreedriveUpdater,
}

impl Bench {
    fn new(config: &ControllerConfig) -> Self {
        let registry = SlotRegistry::from_layout(&config.layout()).unwrap();
        let table = SlotTable::shared();
        let layout = HardwareLayout::from_registry(&registry, &config.params.tf_prefix).unwrap();
        let mut hal = HalCore::new(
            config.hal_config(),
            layout,
            Arc::clone(&table),
            config.cycle_time_us,
        )
        .unwrap();
        hal.init(&DriverRegistry::with_builtin()).unwrap();

        let mut controller = FreedriveController::new(Arc::new(ReportChannel::unbounded().0));
        controller
            .on_configure(config.params.clone(), &registry)
            .unwrap();
        let updater = controller.on_activate(&table).unwrap();
        Self {
            hal,
            controller,
            updater,
        }
    }

    fn cycle(&mut self) {
        self.hal.step(PERIOD).unwrap();
        self.updater.update(Duration::ZERO, PERIOD);
    }

    fn run_until_done(&mut self, goal: &ActiveGoal, max_cycles: usize) {
        for _ in 0..max_cycles {
            if goal.status().is_terminal() {
                return;
            }
            self.cycle();
        }
    }

    fn simulated_freedrive(&self) -> bool {
        self.hal
            .diagnostics()
            .and_then(|d| d.custom)
            .is_some_and(|json| json.contains("\"freedrive_active\":true"))
    }
}

fn config(simulation: SimulationConfig) -> ControllerConfig {
    let mut config = ControllerConfig {
        simulation,
        ..Default::default()
    };
    config.params.action_monitor_period = 10.0;
    config
}

#[test]
fn enable_then_disable_through_simulation() {
    let mut bench = Bench::new(&config(SimulationConfig {
        response_latency_cycles: 3,
        initialize_after_cycles: 2,
        ..Default::default()
    }));

    assert_eq!(
        bench.controller.submit(FreedriveRequest::ENABLE).unwrap_err(),
        RejectReason::HardwareNotReady
    );
    for _ in 0..3 {
        bench.cycle();
    }

    let enable = bench.controller.submit(FreedriveRequest::ENABLE).unwrap();
    bench.run_until_done(&enable, 20);
    assert_eq!(enable.status(), GoalStatus::Succeeded);
    assert!(bench.controller.is_freedrive_active());
    assert!(bench.simulated_freedrive());

    let disable = bench.controller.submit(FreedriveRequest::DISABLE).unwrap();
    bench.run_until_done(&disable, 20);
    assert_eq!(disable.status(), GoalStatus::Succeeded);
    assert!(!bench.controller.is_freedrive_active());
    assert!(!bench.simulated_freedrive());

    bench.controller.on_deactivate().unwrap();
    bench.hal.shutdown().unwrap();
}

#[test]
fn cancel_through_simulation() {
    let mut bench = Bench::new(&config(SimulationConfig {
        response_latency_cycles: 5,
        ..Default::default()
    }));
    bench.cycle();

    let goal = bench.controller.submit(FreedriveRequest::ENABLE).unwrap();
    bench.cycle();
    bench.controller.cancel(goal.id());
    bench.run_until_done(&goal, 30);

    assert_eq!(goal.status(), GoalStatus::Canceled);
    assert!(!bench.simulated_freedrive());
    bench.controller.on_deactivate().unwrap();
}

#[test]
fn rejecting_firmware_aborts_goal() {
    let mut bench = Bench::new(&config(SimulationConfig {
        response_latency_cycles: 1,
        reject_commands: true,
        ..Default::default()
    }));
    bench.cycle();

    let goal = bench.controller.submit(FreedriveRequest::ENABLE).unwrap();
    bench.run_until_done(&goal, 10);
    assert_eq!(goal.reason(), Some(TerminalReason::HardwareRejected));
    bench.controller.on_deactivate().unwrap();
}

#[test]
fn silent_firmware_times_out() {
    let mut config = config(SimulationConfig {
        unresponsive: true,
        ..Default::default()
    });
    config.params.maximum_retries = 5;
    let mut bench = Bench::new(&config);
    bench.cycle();

    let goal = bench.controller.submit(FreedriveRequest::ENABLE).unwrap();
    bench.run_until_done(&goal, 50);
    assert_eq!(goal.reason(), Some(TerminalReason::AsyncTimeout));
    bench.controller.on_deactivate().unwrap();
}

#[test]
fn threaded_loops_complete_goal() {
    let mut config = config(SimulationConfig {
        response_latency_cycles: 2,
        ..Default::default()
    });
    config.cycle_time_us = 1000;
    config.params.maximum_retries = 1_000;

    let registry = SlotRegistry::from_layout(&config.layout()).unwrap();
    let table = SlotTable::shared();
    let layout = HardwareLayout::from_registry(&registry, "").unwrap();
    let mut hal = HalCore::new(
        config.hal_config(),
        layout,
        Arc::clone(&table),
        config.cycle_time_us,
    )
    .unwrap();
    hal.init(&DriverRegistry::with_builtin()).unwrap();
    let hal_running = hal.running_flag();
    let hal_thread = thread::spawn(move || hal.run());

    let (channel, reports) = ReportChannel::unbounded();
    let mut controller = FreedriveController::new(Arc::new(channel));
    controller
        .on_configure(config.params.clone(), &registry)
        .unwrap();
    let updater = controller.on_activate(&table).unwrap();
    let mut runner = CycleRunner::new(updater, config.cycle_time());
    let cycle_running = runner.running_flag();
    let rt_thread = thread::spawn(move || {
        runner.run().unwrap();
        runner
    });

    let goal = loop {
        match controller.submit(FreedriveRequest::ENABLE) {
            Ok(goal) => break goal,
            Err(RejectReason::HardwareNotReady) => thread::sleep(Duration::from_millis(1)),
            Err(other) => panic!("unexpected rejection: {other}"),
        }
    };

    controller.monitor().tick();
    let mut report = None;
    for _ in 0..200 {
        controller.monitor().tick();
        if let Ok(r) = reports.recv_timeout(Duration::from_millis(10)) {
            report = Some(r);
            break;
        }
    }
    let report = report.expect("goal was not reported");
    assert_eq!(report.id, goal.id());
    assert!(report.result.succeeded());

    cycle_running.store(false, Ordering::SeqCst);
    let runner = rt_thread.join().unwrap();
    assert!(runner.updater().counters().completed >= 1);

    controller.on_deactivate().unwrap();
    hal_running.store(false, Ordering::SeqCst);
    hal_thread.join().unwrap().unwrap();
}
