//! Controller error types.

use freedrive_common::config::ConfigError;
use freedrive_common::slots::SlotError;
use thiserror::Error;

use crate::lifecycle::LifecycleState;

/// Lifecycle hook failure.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Parameters out of bounds. Fatal at configure.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Required slot missing or declared with the wrong namespace or encoding.
    #[error("slot error: {0}")]
    Slot(#[from] SlotError),

    /// Goal monitor thread could not be started.
    #[error("goal monitor thread: {0}")]
    Monitor(#[source] std::io::Error),

    /// Hook called in a state that does not allow it.
    #[error("{hook} not allowed in lifecycle state {from}")]
    InvalidTransition {
        /// State the controller was in.
        from: LifecycleState,
        /// Rejected hook.
        hook: &'static str,
    },
}
