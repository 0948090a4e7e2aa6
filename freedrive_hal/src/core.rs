//! HAL Core struct and hardware loop management.
//!
//! `HalCore` owns the active driver and the hardware side of the slot table.
//! It can be stepped one cycle at a time (tests, single-threaded hosts) or run
//! as a paced loop on its own thread until the running flag is cleared.

use freedrive_common::config::Validate;
use freedrive_common::slots::{HardwarePort, SlotTable};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::HalConfig;
use crate::driver::{DriverDiagnostics, HalError, HardwareDriver, HardwareLayout};
use crate::driver_registry::DriverRegistry;

/// Timing statistics for hardware loop monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HalStats {
    /// Number of cycles executed
    pub cycle_count: u64,
    /// Number of timing violations (cycle exceeded target)
    pub timing_violations: u64,
    /// Maximum observed cycle time
    pub max_cycle_time_us: u64,
    /// Sum of cycle times for average calculation
    pub total_cycle_time_us: u64,
}

impl HalStats {
    /// Mean cycle time [µs], 0 before the first cycle.
    pub fn avg_cycle_time_us(&self) -> u64 {
        self.total_cycle_time_us
            .checked_div(self.cycle_count)
            .unwrap_or(0)
    }
}

/// HAL Core manages the driver and the hardware loop.
pub struct HalCore {
    config: HalConfig,
    layout: HardwareLayout,
    port: HardwarePort,
    driver: Option<Box<dyn HardwareDriver>>,
    running: Arc<AtomicBool>,
    cycle_time: Duration,
    stats: HalStats,
}

impl HalCore {
    /// Create a new HalCore over a shared slot table.
    ///
    /// # Errors
    /// Returns error if configuration validation fails.
    pub fn new(
        config: HalConfig,
        layout: HardwareLayout,
        table: Arc<SlotTable>,
        cycle_time_us: u32,
    ) -> Result<Self, HalError> {
        config
            .validate()
            .map_err(|e| HalError::ConfigError(e.to_string()))?;

        info!(
            "HalCore created: driver='{}', cycle_time={}us",
            config.driver, cycle_time_us
        );

        Ok(Self {
            config,
            layout,
            port: HardwarePort::new(table),
            driver: None,
            running: Arc::new(AtomicBool::new(false)),
            cycle_time: Duration::from_micros(u64::from(cycle_time_us)),
            stats: HalStats::default(),
        })
    }

    /// Load and initialize the configured driver.
    ///
    /// # Errors
    /// Returns error if the driver is unknown or its initialization fails.
    pub fn init(&mut self, registry: &DriverRegistry) -> Result<(), HalError> {
        info!("Initializing HalCore with driver '{}'...", self.config.driver);

        let mut driver = registry.create_driver(&self.config.driver)?;
        info!("Created driver: {} v{}", driver.name(), driver.version());

        driver.init(&self.config, self.layout)?;
        self.driver = Some(driver);
        self.running.store(true, Ordering::SeqCst);

        info!("HalCore initialized successfully");
        Ok(())
    }

    /// Execute exactly one driver cycle.
    ///
    /// # Errors
    /// Returns error if no driver has been initialized.
    pub fn step(&mut self, dt: Duration) -> Result<(), HalError> {
        let driver = self
            .driver
            .as_mut()
            .ok_or_else(|| HalError::InitFailed("Driver not initialized".to_string()))?;

        let cycle_start = Instant::now();
        driver.cycle(&self.port, dt);
        self.record(cycle_start.elapsed());
        Ok(())
    }

    /// Run the paced hardware loop.
    ///
    /// Blocks until the running flag is cleared. The flag is raised by
    /// [`HalCore::init`].
    ///
    /// # Errors
    /// Returns error if no driver has been initialized.
    pub fn run(&mut self) -> Result<(), HalError> {
        if self.driver.is_none() {
            return Err(HalError::InitFailed("Driver not initialized".to_string()));
        }

        info!(
            "Starting HalCore loop (cycle_time={}us)...",
            self.cycle_time.as_micros()
        );

        if detect_rt_mode() {
            info!("Running in real-time mode");
        } else {
            info!("Running in standard (non-RT) mode");
        }

        let mut last_cycle = Instant::now();
        while self.running.load(Ordering::SeqCst) {
            let cycle_start = Instant::now();
            let dt = cycle_start.duration_since(last_cycle);
            last_cycle = cycle_start;

            self.step(dt)?;

            let elapsed = cycle_start.elapsed();
            if elapsed < self.cycle_time {
                std::thread::sleep(self.cycle_time - elapsed);
            }

            if self.stats.cycle_count % 1000 == 0 {
                debug!(
                    "HAL loop: {} cycles, avg={}us, max={}us, violations={}",
                    self.stats.cycle_count,
                    self.stats.avg_cycle_time_us(),
                    self.stats.max_cycle_time_us,
                    self.stats.timing_violations
                );
            }
        }

        info!(
            "HalCore loop stopped after {} cycles (violations: {})",
            self.stats.cycle_count, self.stats.timing_violations
        );
        Ok(())
    }

    fn record(&mut self, elapsed: Duration) {
        let cycle_time_us = elapsed.as_micros() as u64;
        self.stats.cycle_count += 1;
        self.stats.total_cycle_time_us += cycle_time_us;
        self.stats.max_cycle_time_us = self.stats.max_cycle_time_us.max(cycle_time_us);

        if elapsed > self.cycle_time {
            self.stats.timing_violations += 1;
            if self.stats.timing_violations <= 10 || self.stats.timing_violations % 1000 == 0 {
                warn!(
                    "Timing violation #{}: hardware cycle took {}us (target {}us)",
                    self.stats.timing_violations,
                    cycle_time_us,
                    self.cycle_time.as_micros()
                );
            }
        }
    }

    /// Stop the loop and shut the driver down.
    pub fn shutdown(&mut self) -> Result<(), HalError> {
        info!("HAL shutdown requested");
        self.running.store(false, Ordering::SeqCst);

        if let Some(driver) = self.driver.as_mut() {
            driver.shutdown()?;
        }
        self.driver = None;
        Ok(())
    }

    /// Get the running flag for signal handlers.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Timing statistics.
    pub fn stats(&self) -> HalStats {
        self.stats
    }

    /// Diagnostics of the active driver.
    pub fn diagnostics(&self) -> Option<DriverDiagnostics> {
        self.driver.as_ref().and_then(|d| d.diagnostics())
    }

    /// Hardware-side view of the slot table.
    pub fn port(&self) -> &HardwarePort {
        &self.port
    }
}

/// Detect if running in real-time mode by checking scheduler policy.
fn detect_rt_mode() -> bool {
    #[cfg(target_os = "linux")]
    {
        use libc::{SCHED_FIFO, SCHED_RR, sched_getscheduler};
        // SAFETY: sched_getscheduler(0) only queries the calling thread's policy.
        let policy = unsafe { sched_getscheduler(0) };
        policy == SCHED_FIFO || policy == SCHED_RR
    }
    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}
