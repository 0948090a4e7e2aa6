//! Freedrive Common Library
//!
//! Shared definitions for the freedrive controller workspace: the interface-slot
//! contract shared with the hardware layer, the goal model exchanged with the
//! request channel, and TOML configuration loading.
//!
//! # Module Structure
//!
//! - [`consts`] - Numeric limits, defaults and slot indices
//! - [`config`] - Configuration loading traits and types
//! - [`slots`] - Named interface slots, value encodings, registry and atomic table
//! - [`goal`] - Goal identifiers, requests, statuses and results
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use freedrive_common::prelude::*;
//!
//! let layout = SlotLayout::robot_default("");
//! let registry = SlotRegistry::from_layout(&layout).unwrap();
//! assert!(registry.lookup("freedrive_mode/enable").is_some());
//! ```

pub mod config;
pub mod consts;
pub mod goal;
pub mod prelude;
pub mod slots;
