//! Controller parameters and host configuration.
//!
//! ```toml
//! cycle_time_us = 2000
//! driver = "simulation"
//!
//! [shared]
//! log_level = "info"
//! service_name = "freedrive_controller"
//!
//! [params]
//! maximum_retries = 10
//! action_monitor_period = 0.05
//! tf_prefix = ""
//! allow_preemption = true
//!
//! [simulation]
//! response_latency_cycles = 3
//! ```
//!
//! `[[slots]]` entries replace the default robot layout when present.

use freedrive_common::config::{ConfigError, SharedConfig, Validate};
use freedrive_common::consts::{
    ACTION_MONITOR_PERIOD_DEFAULT, ACTION_MONITOR_PERIOD_MAX, CYCLE_TIME_US, CYCLE_TIME_US_MAX,
    CYCLE_TIME_US_MIN, MAXIMUM_RETRIES_DEFAULT, MAXIMUM_RETRIES_MAX,
};
use freedrive_common::slots::{SlotLayout, SlotSpec};
use freedrive_hal::config::{HalConfig, SIMULATION_DRIVER, SimulationConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ─── Controller Parameters ──────────────────────────────────────────

fn default_maximum_retries() -> u32 {
    MAXIMUM_RETRIES_DEFAULT
}

fn default_action_monitor_period() -> f64 {
    ACTION_MONITOR_PERIOD_DEFAULT
}

fn default_allow_preemption() -> bool {
    true
}

/// Parameters read once at configure time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreedriveParams {
    /// Pending handshake reads tolerated before a goal times out [cycles].
    #[serde(default = "default_maximum_retries")]
    pub maximum_retries: u32,

    /// Monitoring timer period [s].
    #[serde(default = "default_action_monitor_period")]
    pub action_monitor_period: f64,

    /// Prefix joined to every slot name.
    #[serde(default)]
    pub tf_prefix: String,

    /// A new goal replaces an executing one. When `false`, it is rejected.
    #[serde(default = "default_allow_preemption")]
    pub allow_preemption: bool,
}

impl Default for FreedriveParams {
    fn default() -> Self {
        Self {
            maximum_retries: default_maximum_retries(),
            action_monitor_period: default_action_monitor_period(),
            tf_prefix: String::new(),
            allow_preemption: default_allow_preemption(),
        }
    }
}

impl FreedriveParams {
    /// Monitoring timer period as a `Duration`. Call after validation.
    pub fn monitor_period(&self) -> Duration {
        Duration::from_secs_f64(self.action_monitor_period)
    }
}

impl Validate for FreedriveParams {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.maximum_retries > MAXIMUM_RETRIES_MAX {
            return Err(ConfigError::ValidationError(format!(
                "params.maximum_retries {} exceeds {}",
                self.maximum_retries, MAXIMUM_RETRIES_MAX
            )));
        }
        let period = self.action_monitor_period;
        if !(period > 0.0 && period <= ACTION_MONITOR_PERIOD_MAX) {
            return Err(ConfigError::ValidationError(format!(
                "params.action_monitor_period {period} outside (0, {ACTION_MONITOR_PERIOD_MAX}]"
            )));
        }
        if self.tf_prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::ValidationError(
                "params.tf_prefix cannot contain whitespace".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Host Configuration ─────────────────────────────────────────────

fn default_cycle_time_us() -> u32 {
    CYCLE_TIME_US
}

fn default_driver() -> String {
    SIMULATION_DRIVER.to_string()
}

/// Everything the controller binary needs: controller parameters, slot layout
/// and the hardware loop it drives against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Service name and log level.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Control cycle [µs].
    #[serde(default = "default_cycle_time_us")]
    pub cycle_time_us: u32,

    /// Hardware driver name.
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Controller parameters.
    #[serde(default)]
    pub params: FreedriveParams,

    /// Slot layout. Empty selects the default robot layout.
    #[serde(default)]
    pub slots: Vec<SlotSpec>,

    /// Simulated firmware behavior.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            cycle_time_us: default_cycle_time_us(),
            driver: default_driver(),
            params: FreedriveParams::default(),
            slots: Vec::new(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Declared slot layout, or the default robot layout under `tf_prefix`.
    pub fn layout(&self) -> SlotLayout {
        if self.slots.is_empty() {
            SlotLayout::robot_default(&self.params.tf_prefix)
        } else {
            SlotLayout {
                slots: self.slots.clone(),
            }
        }
    }

    /// Hardware loop configuration.
    pub fn hal_config(&self) -> HalConfig {
        HalConfig {
            driver: self.driver.clone(),
            simulation: self.simulation.clone(),
        }
    }

    /// Control cycle as a `Duration`.
    pub fn cycle_time(&self) -> Duration {
        Duration::from_micros(u64::from(self.cycle_time_us))
    }
}

impl Validate for ControllerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if !(CYCLE_TIME_US_MIN..=CYCLE_TIME_US_MAX).contains(&self.cycle_time_us) {
            return Err(ConfigError::ValidationError(format!(
                "cycle_time_us {} outside [{CYCLE_TIME_US_MIN}, {CYCLE_TIME_US_MAX}]",
                self.cycle_time_us
            )));
        }
        self.params.validate()?;
        self.hal_config().validate()
    }
}
