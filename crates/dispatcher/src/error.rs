//! Dispatcher error types

use contracts::{ScopedWakelock, SubHalIndex};
use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Wake lock state disagrees with the wake-up count of the batch.
    ///
    /// Always a caller-side bug. The guard is handed back untouched so the
    /// caller decides what happens to the reference it holds.
    #[error(
        "wake lock mismatch for sub-hal {sub_hal}: locked={locked}, wakeup_count={wakeup_count}"
    )]
    WakelockMismatch {
        sub_hal: SubHalIndex,
        wakeup_count: usize,
        locked: bool,
        wakelock: ScopedWakelock,
    },

    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Sink write error (from contract)
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Whether this error signals a broken wake lock invariant
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::WakelockMismatch { .. })
    }
}
