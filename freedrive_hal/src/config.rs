//! HAL configuration.
//!
//! ```toml
//! [hal]
//! driver = "simulation"
//!
//! [simulation]
//! response_latency_cycles = 3
//! reject_commands = false
//! unresponsive = false
//! initialize_after_cycles = 0
//! ```

use freedrive_common::config::{ConfigError, Validate};
use serde::{Deserialize, Serialize};

/// Name of the built-in simulation driver.
pub const SIMULATION_DRIVER: &str = "simulation";

/// Upper bound on simulated hardware latency [cycles].
pub const RESPONSE_LATENCY_MAX: u32 = 100_000;

fn default_driver() -> String {
    SIMULATION_DRIVER.to_string()
}

fn default_response_latency() -> u32 {
    3
}

/// Hardware loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HalConfig {
    /// Driver to load from the registry.
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Settings for the simulation driver.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Validate for HalConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.driver.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "hal.driver cannot be empty".to_string(),
            ));
        }
        self.simulation.validate()
    }
}

/// Behavior of the simulated robot firmware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Cycles between seeing an armed handshake and answering it.
    #[serde(default = "default_response_latency")]
    pub response_latency_cycles: u32,

    /// Answer every handshake with failure.
    #[serde(default)]
    pub reject_commands: bool,

    /// Never answer handshakes.
    #[serde(default)]
    pub unresponsive: bool,

    /// Cycles before the interface reports itself initialized.
    #[serde(default)]
    pub initialize_after_cycles: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            response_latency_cycles: default_response_latency(),
            reject_commands: false,
            unresponsive: false,
            initialize_after_cycles: 0,
        }
    }
}

impl Validate for SimulationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.response_latency_cycles > RESPONSE_LATENCY_MAX {
            return Err(ConfigError::ValidationError(format!(
                "simulation.response_latency_cycles {} exceeds {}",
                self.response_latency_cycles, RESPONSE_LATENCY_MAX
            )));
        }
        if self.reject_commands && self.unresponsive {
            return Err(ConfigError::ValidationError(
                "simulation.reject_commands and simulation.unresponsive are exclusive".to_string(),
            ));
        }
        Ok(())
    }
}
