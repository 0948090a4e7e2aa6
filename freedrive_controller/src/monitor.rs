//! Monitoring timer (non-RT).
//!
//! Runs at `action_monitor_period`, decoupled from the control cycle. Each
//! tick aborts in-flight goals once the controller has left Active, then
//! reports every finished goal to the goal channel exactly once and drops the
//! last owning reference. Goals are only ever deallocated here.

use freedrive_common::goal::{GoalStatus, TerminalReason};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::controller::Shared;

/// Name of the monitor thread.
pub const MONITOR_THREAD_NAME: &str = "freedrive_monitor";

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorTick {
    /// Goals aborted because the controller is not Active.
    pub aborted: usize,
    /// Results delivered to the channel.
    pub reported: usize,
}

/// Periodic drain of finished goals.
pub struct GoalMonitor {
    shared: Arc<Shared>,
}

impl GoalMonitor {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// One monitoring pass.
    pub fn tick(&self) -> MonitorTick {
        let shared = &self.shared;
        let aborted = if shared.is_active() {
            0
        } else {
            shared.abort_in_flight(TerminalReason::ControllerInactive)
        };

        let finished = shared.goals.drain_finished(|| shared.rt_quiescent());
        let mut reported = 0;
        for goal in finished {
            let Some(result) = goal.result() else {
                continue;
            };
            match result.status {
                GoalStatus::Succeeded | GoalStatus::Canceled => {
                    info!("{} {}: {}", goal.id(), result.status, result.message)
                }
                _ => warn!("{} {}: {}", goal.id(), result.status, result.message),
            }
            shared.channel.on_terminal(goal.id(), &result);
            reported += 1;
        }

        MonitorTick { aborted, reported }
    }

    /// Run [`GoalMonitor::tick`] every `period` on a dedicated thread.
    pub fn spawn(self, period: Duration) -> std::io::Result<MonitorHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name(MONITOR_THREAD_NAME.to_string())
            .spawn(move || {
                debug!("Goal monitor started (period={period:?})");
                while !flag.load(Ordering::Acquire) {
                    self.tick();
                    thread::park_timeout(period);
                }
                debug!("Goal monitor stopped");
            })?;
        Ok(MonitorHandle {
            stop,
            thread: Some(thread),
        })
    }
}

/// Owner of a running monitor thread. Stops it when dropped.
#[derive(Debug)]
pub struct MonitorHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Stop the thread and wait for its current tick to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            thread.thread().unpark();
            if thread.join().is_err() {
                warn!("Goal monitor thread panicked");
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
