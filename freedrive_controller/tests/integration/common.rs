//! Shared test rig: an active controller over a fresh slot table.

use crossbeam_channel::Receiver;
use freedrive_common::consts::{
    FREEDRIVE_MODE_ABORT_INDEX, FREEDRIVE_MODE_ASYNC_SUCCESS_INDEX, FREEDRIVE_MODE_CMD_INDEX,
    FREEDRIVE_MODE_DISABLE_INDEX, INITIALIZED_FLAG_INDEX,
};
use freedrive_common::goal::GoalReport;
use freedrive_common::slots::{AsyncStatus, HardwarePort, SlotLayout, SlotRegistry, SlotTable};
use freedrive_controller::{FreedriveController, FreedriveParams, FreedriveUpdater, ReportChannel};
use std::sync::Arc;
use std::time::Duration;

pub const PERIOD: Duration = Duration::from_millis(2);

pub const STATUS: u16 = FREEDRIVE_MODE_ASYNC_SUCCESS_INDEX;
pub const CMD: u16 = FREEDRIVE_MODE_CMD_INDEX;
pub const ABORT: u16 = FREEDRIVE_MODE_ABORT_INDEX;
pub const DISABLE: u16 = FREEDRIVE_MODE_DISABLE_INDEX;

pub struct Rig {
    pub controller: FreedriveController,
    pub updater: FreedriveUpdater,
    pub port: HardwarePort,
    pub table: Arc<SlotTable>,
    pub reports: Receiver<GoalReport>,
}

impl Rig {
    /// Active controller with the default layout and initialized hardware.
    /// The monitor thread is slowed down so tests tick it by hand.
    pub fn active(params: FreedriveParams) -> Self {
        Self::with_layout(params, SlotLayout::robot_default(""))
    }

    pub fn with_layout(params: FreedriveParams, layout: SlotLayout) -> Self {
        let params = FreedriveParams {
            action_monitor_period: 10.0,
            ..params
        };
        let (channel, reports) = ReportChannel::unbounded();
        let mut controller = FreedriveController::new(Arc::new(channel));
        let registry = SlotRegistry::from_layout(&layout).unwrap();
        controller.on_init().unwrap();
        controller.on_configure(params, &registry).unwrap();
        let table = SlotTable::shared();
        let updater = controller.on_activate(&table).unwrap();
        let port = HardwarePort::new(Arc::clone(&table));
        port.set_state(INITIALIZED_FLAG_INDEX, 1.0);
        Self {
            controller,
            updater,
            port,
            table,
            reports,
        }
    }

    pub fn retries(max: u32) -> Self {
        Self::active(FreedriveParams {
            maximum_retries: max,
            ..Default::default()
        })
    }

    pub fn update(&mut self) {
        self.updater.update(Duration::ZERO, PERIOD);
    }

    pub fn confirm(&self) -> bool {
        self.port.resolve_async(STATUS, AsyncStatus::Succeeded)
    }

    pub fn refuse(&self) -> bool {
        self.port.resolve_async(STATUS, AsyncStatus::Failed)
    }

    /// Tick the monitor and wait for exactly `count` reports.
    ///
    /// The monitor thread may deliver some of them first; either way each
    /// goal is reported once.
    pub fn expect_reports(&self, count: usize) -> Vec<GoalReport> {
        self.controller.monitor().tick();
        let reports: Vec<GoalReport> = (0..count)
            .map(|_| self.reports.recv_timeout(Duration::from_secs(2)).unwrap())
            .collect();
        self.controller.monitor().tick();
        assert!(self.reports.try_recv().is_err(), "unexpected extra report");
        reports
    }
}
