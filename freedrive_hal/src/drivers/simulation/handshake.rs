//! Firmware side of the async handshake.

use freedrive_common::slots::AsyncStatus;

use crate::config::SimulationConfig;

/// How the simulated firmware answers armed handshakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Confirm every command.
    Accept,
    /// Fail every command.
    Reject,
    /// Never answer.
    Silent,
}

impl ResponseMode {
    /// Mode selected by a simulation config.
    pub fn from_config(config: &SimulationConfig) -> Self {
        if config.unresponsive {
            Self::Silent
        } else if config.reject_commands {
            Self::Reject
        } else {
            Self::Accept
        }
    }
}

/// Result of one handshake step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStep {
    /// Nothing armed.
    Idle,
    /// Armed, answer not due yet.
    Waiting,
    /// Answer due now.
    Answer(AsyncStatus),
}

/// Latency counter for one async-status slot.
///
/// The counter restarts whenever the commanded value changes while the slot is
/// still armed, so a re-issued command gets its own full latency.
#[derive(Debug, Clone)]
pub struct Handshake {
    latency: u32,
    mode: ResponseMode,
    waited: u32,
    armed_cmd: Option<f64>,
}

impl Handshake {
    /// Handshake answering after `latency` armed cycles.
    pub fn new(latency: u32, mode: ResponseMode) -> Self {
        Self {
            latency,
            mode,
            waited: 0,
            armed_cmd: None,
        }
    }

    /// Advance one hardware cycle.
    pub fn step(&mut self, armed: bool, cmd: f64) -> HandshakeStep {
        if !armed {
            self.armed_cmd = None;
            self.waited = 0;
            return HandshakeStep::Idle;
        }
        if self.armed_cmd != Some(cmd) {
            self.armed_cmd = Some(cmd);
            self.waited = 0;
        }
        if self.waited < self.latency {
            self.waited += 1;
            return HandshakeStep::Waiting;
        }
        match self.mode {
            ResponseMode::Accept => HandshakeStep::Answer(AsyncStatus::Succeeded),
            ResponseMode::Reject => HandshakeStep::Answer(AsyncStatus::Failed),
            ResponseMode::Silent => HandshakeStep::Waiting,
        }
    }
}
