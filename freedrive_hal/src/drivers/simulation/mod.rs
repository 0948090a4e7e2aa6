//! Simulation driver module.
//!
//! Emulates the robot firmware side of the freedrive handshake so the
//! controller can run without a robot attached.

mod driver;
mod handshake;

pub use driver::SimulationDriver;
pub use handshake::{Handshake, HandshakeStep, ResponseMode};

use crate::driver::HardwareDriver;

/// Registry name of the simulation driver.
pub const NAME: &str = "simulation";

/// Factory function to create a simulation driver instance.
pub fn create_driver() -> Box<dyn HardwareDriver> {
    Box::new(SimulationDriver::new())
}
