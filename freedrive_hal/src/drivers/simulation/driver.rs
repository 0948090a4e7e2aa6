//! Simulation driver implementation.
//!
//! Behaves like the robot firmware for the freedrive slots: raises the
//! initialized flag after a configurable delay, answers armed handshakes after
//! a configurable latency and tracks whether the arm is in freedrive.

use freedrive_common::slots::{AsyncStatus, FLAG_ON, HardwarePort, decode_flag};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use super::handshake::{Handshake, HandshakeStep, ResponseMode};
use crate::config::HalConfig;
use crate::driver::{DriverDiagnostics, HalError, HardwareDriver, HardwareLayout};

/// Simulation driver implementing the `HardwareDriver` trait.
pub struct SimulationDriver {
    version: &'static str,
    layout: Option<HardwareLayout>,
    handshake: Handshake,
    initialize_after_cycles: u32,
    initialized: bool,
    freedrive_active: bool,
    cycle_count: u64,
    responses: u64,
}

#[derive(Serialize)]
struct SimulationSnapshot {
    initialized: bool,
    freedrive_active: bool,
}

impl SimulationDriver {
    /// Create a new simulation driver instance.
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            layout: None,
            handshake: Handshake::new(0, ResponseMode::Accept),
            initialize_after_cycles: 0,
            initialized: false,
            freedrive_active: false,
            cycle_count: 0,
            responses: 0,
        }
    }

    /// Whether the simulated arm is currently in freedrive.
    pub fn is_freedrive_active(&self) -> bool {
        self.freedrive_active
    }

    /// Whether the initialized flag has been raised.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn trigger(port: &HardwarePort, index: Option<u16>) -> bool {
        index
            .and_then(|i| port.command(i))
            .is_some_and(decode_flag)
    }
}

impl Default for SimulationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        super::NAME
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn init(&mut self, config: &HalConfig, layout: HardwareLayout) -> Result<(), HalError> {
        let sim = &config.simulation;
        let mode = ResponseMode::from_config(sim);
        info!(
            "Initializing simulation driver: latency={} cycles, mode={:?}, initialize_after={} cycles",
            sim.response_latency_cycles, mode, sim.initialize_after_cycles
        );
        if mode != ResponseMode::Accept {
            warn!("Simulated firmware will not confirm freedrive commands ({:?})", mode);
        }

        self.handshake = Handshake::new(sim.response_latency_cycles, mode);
        self.initialize_after_cycles = sim.initialize_after_cycles;
        self.layout = Some(layout);
        self.initialized = false;
        self.freedrive_active = false;
        self.cycle_count = 0;
        self.responses = 0;
        Ok(())
    }

    fn cycle(&mut self, port: &HardwarePort, _dt: Duration) {
        let Some(layout) = self.layout else {
            return;
        };
        self.cycle_count += 1;

        if !self.initialized {
            if self.cycle_count <= u64::from(self.initialize_after_cycles) {
                return;
            }
            port.set_state(layout.initialized, FLAG_ON);
            self.initialized = true;
        }

        let abort = Self::trigger(port, layout.abort);
        if abort {
            self.freedrive_active = false;
        }

        let cmd = port.command(layout.cmd).unwrap_or(0.0);
        let armed = port.is_pending(layout.async_success);
        let HandshakeStep::Answer(status) = self.handshake.step(armed, cmd) else {
            return;
        };
        if !port.resolve_async(layout.async_success, status) {
            return;
        }
        self.responses += 1;
        if status == AsyncStatus::Succeeded {
            let disable = Self::trigger(port, layout.disable);
            self.freedrive_active = decode_flag(cmd) && !abort && !disable;
        }
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        info!(
            "Shutting down simulation driver after {} cycles ({} handshakes answered)",
            self.cycle_count, self.responses
        );
        self.freedrive_active = false;
        self.layout = None;
        Ok(())
    }

    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        let snapshot = SimulationSnapshot {
            initialized: self.initialized,
            freedrive_active: self.freedrive_active,
        };
        Some(DriverDiagnostics {
            cycle_count: self.cycle_count,
            responses: self.responses,
            custom: serde_json::to_string(&snapshot).ok(),
        })
    }
}
