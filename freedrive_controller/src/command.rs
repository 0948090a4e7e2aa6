//! Commands issued to the hardware.

pub mod async_command;

pub use async_command::{AsyncCommand, AsyncPoll};
