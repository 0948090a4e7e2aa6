//! Freedrive controller: lifecycle hooks and goal callbacks (non-RT).
//!
//! The controller owns the state shared by its three execution domains:
//!
//! ```text
//!  goal callbacks ──publish──► GoalHandoff ──peek──► FreedriveUpdater (RT)
//!        │                                                 │
//!        └──register──► GoalRegistry ◄──drain── GoalMonitor (timer)
//! ```
//!
//! Goal callbacks and the monitor write Command slots only under the host side
//! of the slot table's write gate; the RT update only ever tries the gate.

use arc_swap::ArcSwapOption;
use freedrive_common::config::Validate;
use freedrive_common::goal::{
    CancelResponse, FreedriveRequest, GoalId, GoalResponse, GoalStatus, RejectReason,
    TerminalReason,
};
use freedrive_common::slots::{OptionalSlots, SlotNamespace, SlotRegistry, SlotTable};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::channel::GoalChannel;
use crate::error::ControllerError;
use crate::goal::{
    ActiveGoal, GoalEvent, GoalHandoff, GoalRegistry, GoalTransition, end_goal, release_unbound,
};
use crate::lifecycle::{LifecycleEvent, LifecycleMachine, LifecycleState, LifecycleTransition};
use crate::monitor::{GoalMonitor, MonitorHandle};
use crate::params::FreedriveParams;
use crate::slots::{FreedriveSlots, ResolvedSlots};
use crate::update::FreedriveUpdater;

/// How long deactivation waits for an RT update to leave before giving up
/// on reporting finished goals.
const STOP_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

// ─── Shared State ───────────────────────────────────────────────────

/// State reachable from callbacks, the RT update and the monitor.
pub(crate) struct Shared {
    lifecycle: AtomicU8,
    pub(crate) handoff: GoalHandoff,
    pub(crate) goals: GoalRegistry,
    pub(crate) slots: ArcSwapOption<FreedriveSlots>,
    pub(crate) freedrive_active: AtomicBool,
    /// Odd while an RT update is running.
    rt_seq: AtomicU64,
    pub(crate) channel: Arc<dyn GoalChannel>,
}

impl Shared {
    fn new(channel: Arc<dyn GoalChannel>) -> Self {
        Self {
            lifecycle: AtomicU8::new(LifecycleState::Unconfigured as u8),
            handoff: GoalHandoff::new(),
            goals: GoalRegistry::new(),
            slots: ArcSwapOption::empty(),
            freedrive_active: AtomicBool::new(false),
            rt_seq: AtomicU64::new(0),
            channel,
        }
    }

    #[inline]
    pub(crate) fn lifecycle(&self) -> LifecycleState {
        LifecycleState::from_u8(self.lifecycle.load(Ordering::Acquire))
            .unwrap_or(LifecycleState::Finalized)
    }

    fn set_lifecycle(&self, state: LifecycleState) {
        self.lifecycle.store(state as u8, Ordering::Release);
    }

    #[inline]
    pub(crate) fn is_active(&self) -> bool {
        self.lifecycle() == LifecycleState::Active
    }

    #[inline]
    pub(crate) fn rt_enter(&self) {
        self.rt_seq.fetch_add(1, Ordering::SeqCst);
    }

    #[inline]
    pub(crate) fn rt_exit(&self) {
        self.rt_seq.fetch_add(1, Ordering::SeqCst);
    }

    /// No RT update is running right now.
    pub(crate) fn rt_quiescent(&self) -> bool {
        self.rt_seq.load(Ordering::SeqCst) % 2 == 0
    }

    /// Abort every goal still in flight and finish its cleanup.
    ///
    /// Returns how many goals this call moved to `Aborted`.
    pub(crate) fn abort_in_flight(&self, reason: TerminalReason) -> usize {
        let pending = self.goals.unreleased();
        if pending.is_empty() {
            return 0;
        }

        let abort = |goal: &ActiveGoal| {
            matches!(
                goal.apply(GoalEvent::Abort(reason)),
                GoalTransition::Ok(GoalStatus::Aborted)
            )
        };

        let mut aborted = 0;
        match self.slots.load_full() {
            Some(slots) => {
                let guard = slots.gate().lock_host();
                for goal in &pending {
                    aborted += usize::from(abort(goal));
                    end_goal(goal, &slots, &self.handoff, &guard);
                }
            }
            None => {
                for goal in &pending {
                    aborted += usize::from(abort(goal));
                    release_unbound(goal, &self.handoff);
                }
            }
        }
        aborted
    }
}

// ─── Controller ─────────────────────────────────────────────────────

/// Freedrive mode controller.
///
/// Lifecycle hooks take `&mut self` and are serialized by the host. Goal
/// callbacks take `&self` and may run on any non-RT thread.
pub struct FreedriveController {
    shared: Arc<Shared>,
    params: FreedriveParams,
    resolved: Option<ResolvedSlots>,
    next_id: AtomicU64,
    submit_lock: Mutex<()>,
    monitor: Option<MonitorHandle>,
}

impl FreedriveController {
    /// Unconfigured controller reporting results to `channel`.
    pub fn new(channel: Arc<dyn GoalChannel>) -> Self {
        Self {
            shared: Arc::new(Shared::new(channel)),
            params: FreedriveParams::default(),
            resolved: None,
            next_id: AtomicU64::new(1),
            submit_lock: Mutex::new(()),
            monitor: None,
        }
    }

    // ─── Lifecycle Hooks ────────────────────────────────────────────

    fn transition(&self, event: LifecycleEvent) -> Result<LifecycleState, ControllerError> {
        let from = self.lifecycle_state();
        match LifecycleMachine::handle_event(from, event) {
            LifecycleTransition::Ok(next) => Ok(next),
            LifecycleTransition::Rejected(reason) => {
                warn!("{} rejected in state {from}: {reason}", event.hook());
                Err(ControllerError::InvalidTransition {
                    from,
                    hook: event.hook(),
                })
            }
        }
    }

    /// First hook after construction.
    pub fn on_init(&mut self) -> Result<(), ControllerError> {
        let state = self.lifecycle_state();
        if state != LifecycleState::Unconfigured {
            return Err(ControllerError::InvalidTransition {
                from: state,
                hook: "on_init",
            });
        }
        info!("Freedrive controller initialized");
        Ok(())
    }

    /// Validate `params` and resolve slots from the host registry.
    ///
    /// # Errors
    /// Out-of-bounds parameters, missing required slots or slots declared
    /// with the wrong namespace or encoding. The controller stays
    /// Unconfigured.
    pub fn on_configure(
        &mut self,
        params: FreedriveParams,
        registry: &SlotRegistry,
    ) -> Result<(), ControllerError> {
        let next = self.transition(LifecycleEvent::Configure)?;

        params.validate().inspect_err(|e| error!("on_configure: {e}"))?;
        let resolved = ResolvedSlots::resolve(registry, &params.tf_prefix)
            .inspect_err(|e| error!("on_configure: {e}"))?;

        let optional = resolved.optional();
        if !optional.contains(OptionalSlots::ABORT) {
            warn!("No abort trigger slot; cancellation only resets the mode command");
        }
        if !optional.contains(OptionalSlots::DISABLE) {
            debug!("No disable trigger slot; disable goals only reset the mode command");
        }

        info!(
            "Configured: maximum_retries={}, action_monitor_period={}s, tf_prefix='{}', allow_preemption={}",
            params.maximum_retries,
            params.action_monitor_period,
            params.tf_prefix,
            params.allow_preemption
        );
        self.params = params;
        self.resolved = Some(resolved);
        self.shared.set_lifecycle(next);
        Ok(())
    }

    /// Command slot names the controller claims. Empty before configure.
    pub fn command_interface_configuration(&self) -> Vec<String> {
        self.resolved
            .as_ref()
            .map(|r| r.names(SlotNamespace::Command))
            .unwrap_or_default()
    }

    /// State slot names the controller reads. Empty before configure.
    pub fn state_interface_configuration(&self) -> Vec<String> {
        self.resolved
            .as_ref()
            .map(|r| r.names(SlotNamespace::State))
            .unwrap_or_default()
    }

    /// Bind the slots to `table`, start the monitor and hand out the RT updater.
    pub fn on_activate(
        &mut self,
        table: &Arc<SlotTable>,
    ) -> Result<FreedriveUpdater, ControllerError> {
        let next = self.transition(LifecycleEvent::Activate)?;
        let resolved = self
            .resolved
            .as_ref()
            .ok_or(ControllerError::InvalidTransition {
                from: self.lifecycle_state(),
                hook: LifecycleEvent::Activate.hook(),
            })?;

        let slots = Arc::new(resolved.bind(table)?);
        {
            let guard = slots.gate().lock_host();
            slots.reset(&guard);
        }
        self.shared.freedrive_active.store(false, Ordering::Release);
        self.shared.slots.store(Some(Arc::clone(&slots)));
        self.shared.set_lifecycle(next);

        match self.monitor().spawn(self.params.monitor_period()) {
            Ok(handle) => self.monitor = Some(handle),
            Err(e) => {
                error!("Failed to start goal monitor: {e}");
                self.stop();
                self.shared.set_lifecycle(LifecycleState::Inactive);
                return Err(ControllerError::Monitor(e));
            }
        }

        info!("Freedrive controller active");
        Ok(FreedriveUpdater::new(
            Arc::clone(&self.shared),
            slots,
            self.params.maximum_retries,
        ))
    }

    /// Abort in-flight goals, stop the monitor and unbind the slots.
    pub fn on_deactivate(&mut self) -> Result<(), ControllerError> {
        let next = self.transition(LifecycleEvent::Deactivate)?;
        self.shared.set_lifecycle(next);
        self.stop();
        info!("Freedrive controller inactive");
        Ok(())
    }

    /// Forget parameters and resolved slots.
    pub fn on_cleanup(&mut self) -> Result<(), ControllerError> {
        let next = self.transition(LifecycleEvent::Cleanup)?;
        self.resolved = None;
        self.params = FreedriveParams::default();
        self.shared.set_lifecycle(next);
        info!("Freedrive controller cleaned up");
        Ok(())
    }

    /// Final hook. Deactivates first when needed.
    pub fn on_shutdown(&mut self) -> Result<(), ControllerError> {
        let next = self.transition(LifecycleEvent::Shutdown)?;
        let was_active = self.shared.is_active();
        self.shared.set_lifecycle(next);
        if was_active {
            self.stop();
        }
        self.resolved = None;
        info!("Freedrive controller finalized");
        Ok(())
    }

    /// Shared teardown once the lifecycle has left Active.
    fn stop(&mut self) {
        if let Some(handle) = self.monitor.take() {
            handle.stop();
        }
        let monitor = self.monitor();
        let tick = monitor.tick();
        if tick.aborted > 0 {
            warn!("{} goal(s) aborted: controller left Active", tick.aborted);
        }

        // A tick that overlapped an RT update drained nothing. The lifecycle
        // is no longer Active, so the next update returns at once.
        let deadline = Instant::now() + STOP_DRAIN_TIMEOUT;
        while self.shared.goals.finished() > 0 {
            if Instant::now() >= deadline {
                warn!(
                    "{} finished goal(s) left unreported: RT update did not complete",
                    self.shared.goals.finished()
                );
                break;
            }
            thread::yield_now();
            monitor.tick();
        }

        if let Some(slots) = self.shared.slots.swap(None) {
            let guard = slots.gate().lock_host();
            slots.reset(&guard);
        }
        self.shared.freedrive_active.store(false, Ordering::Release);
    }

    // ─── Goal Callbacks ─────────────────────────────────────────────

    /// Decide whether to take a new goal. No state change.
    pub fn goal_received(&self, request: FreedriveRequest) -> GoalResponse {
        if !self.shared.is_active() {
            return GoalResponse::Reject(RejectReason::ControllerInactive);
        }
        let Some(slots) = self.shared.slots.load_full() else {
            return GoalResponse::Reject(RejectReason::ControllerInactive);
        };
        if !slots.hardware_ready() {
            return GoalResponse::Reject(RejectReason::HardwareNotReady);
        }
        if !self.params.allow_preemption
            && self
                .shared
                .handoff
                .current()
                .is_some_and(|g| !g.status().is_terminal())
        {
            return GoalResponse::Reject(RejectReason::GoalActive);
        }
        debug!("Goal received: enable={}", request.enable);
        GoalResponse::Accept
    }

    /// Take ownership of an accepted goal and start it.
    ///
    /// Any goal still in the handoff buffer is preempted. The hardware
    /// command is issued and the goal published before this returns.
    pub fn goal_accepted(&self, goal: Arc<ActiveGoal>) {
        if let GoalTransition::Rejected(reason) = goal.apply(GoalEvent::Accept) {
            warn!("{}: not accepted: {reason}", goal.id());
            return;
        }

        let Some(slots) = self.shared.slots.load_full() else {
            warn!("{}: controller not active, aborting", goal.id());
            goal.apply(GoalEvent::Abort(TerminalReason::ControllerInactive));
            release_unbound(&goal, &self.shared.handoff);
            self.shared.goals.register(goal);
            return;
        };

        let guard = slots.gate().lock_host();
        if !self.shared.is_active() {
            warn!("{}: controller not active, aborting", goal.id());
            goal.apply(GoalEvent::Abort(TerminalReason::ControllerInactive));
            end_goal(&goal, &slots, &self.shared.handoff, &guard);
            drop(guard);
            self.shared.goals.register(goal);
            return;
        }

        if let Some(previous) = self.shared.handoff.current() {
            let preempted = previous.apply(GoalEvent::Abort(TerminalReason::Preempted));
            if matches!(preempted, GoalTransition::Ok(_)) {
                warn!("{} preempted by {}", previous.id(), goal.id());
            }
            end_goal(&previous, &slots, &self.shared.handoff, &guard);
        }

        slots.issue(&guard, goal.request(), self.params.maximum_retries);
        goal.apply(GoalEvent::Execute);
        self.shared.goals.register(Arc::clone(&goal));
        self.shared.handoff.publish(Arc::clone(&goal));
        drop(guard);

        info!(
            "{} executing: {} freedrive",
            goal.id(),
            if goal.request().enable { "enable" } else { "disable" }
        );
    }

    /// Request cooperative cancellation of the active goal.
    ///
    /// Accepting only raises the cancel flag; the goal turns `Canceled` once
    /// the hardware confirms the disable path.
    pub fn goal_cancelled(&self, id: GoalId) -> CancelResponse {
        match self.shared.handoff.current() {
            Some(goal) if goal.id() == id && goal.request_cancel() => {
                info!("{id}: cancel requested");
                CancelResponse::Accept
            }
            _ => {
                debug!("{id}: cancel rejected, not the active goal");
                CancelResponse::Reject
            }
        }
    }

    // ─── Client Entry Points ────────────────────────────────────────

    /// Submit a request: received, then accepted on success.
    ///
    /// Returns the goal handle; its status can be read at any time.
    pub fn submit(&self, request: FreedriveRequest) -> Result<Arc<ActiveGoal>, RejectReason> {
        let _serial = self.submit_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match self.goal_received(request) {
            GoalResponse::Reject(reason) => {
                warn!("Goal rejected: {reason}");
                Err(reason)
            }
            GoalResponse::Accept => {
                let id = GoalId(self.next_id.fetch_add(1, Ordering::Relaxed));
                let goal = Arc::new(ActiveGoal::new(id, request));
                self.goal_accepted(Arc::clone(&goal));
                Ok(goal)
            }
        }
    }

    /// Cancel a goal by id.
    pub fn cancel(&self, id: GoalId) -> CancelResponse {
        self.goal_cancelled(id)
    }

    // ─── Introspection ──────────────────────────────────────────────

    /// Status of a goal that has not been reported yet.
    pub fn status(&self, id: GoalId) -> Option<GoalStatus> {
        self.shared.goals.find(id).map(|g| g.status())
    }

    /// Current lifecycle state.
    pub fn lifecycle_state(&self) -> LifecycleState {
        self.shared.lifecycle()
    }

    /// Hardware last confirmed freedrive engaged.
    pub fn is_freedrive_active(&self) -> bool {
        self.shared.freedrive_active.load(Ordering::Acquire)
    }

    /// Parameters in effect.
    pub fn params(&self) -> &FreedriveParams {
        &self.params
    }

    /// Monitor over this controller's goals, for manual ticking.
    pub fn monitor(&self) -> GoalMonitor {
        GoalMonitor::new(Arc::clone(&self.shared))
    }
}

impl Drop for FreedriveController {
    fn drop(&mut self) {
        if let Some(handle) = self.monitor.take() {
            handle.stop();
        }
    }
}
