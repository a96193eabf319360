//! Dispatcher - wake lock check and hand-off to the delivery queue

use std::sync::Arc;

use contracts::{DeliveryQueue, EventBatch, ScopedWakelock};
use observability::metrics as proxy_metrics;
use serde::{Deserialize, Serialize};
use tracing::{error, trace};

use crate::error::DispatcherError;

/// How a wake lock invariant violation is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvariantMode {
    /// Log and panic. Release builds abort on panic.
    #[default]
    Abort,
    /// Return [`DispatcherError::WakelockMismatch`] to the caller
    Report,
}

/// Hands processed batches to the delivery queue
///
/// The guard's locked state must equal `wakeup_count > 0`. A mismatch means
/// wake-up accounting is broken upstream and is never corrected here.
pub struct Dispatcher {
    queue: Arc<dyn DeliveryQueue>,
    mode: InvariantMode,
}

impl Dispatcher {
    /// Create a dispatcher that aborts on invariant violations
    pub fn new(queue: Arc<dyn DeliveryQueue>) -> Self {
        Self {
            queue,
            mode: InvariantMode::default(),
        }
    }

    /// Select how invariant violations are surfaced
    pub fn with_mode(mut self, mode: InvariantMode) -> Self {
        self.mode = mode;
        self
    }

    /// Active invariant mode
    pub fn mode(&self) -> InvariantMode {
        self.mode
    }

    /// Hand `batch` and the ownership of `wakelock` to the queue.
    ///
    /// On success the queue owns the guard; this dispatcher never releases it.
    pub fn dispatch(
        &self,
        batch: EventBatch,
        wakelock: ScopedWakelock,
    ) -> Result<(), DispatcherError> {
        let expect_locked = batch.wakeup_count > 0;
        if wakelock.is_locked() != expect_locked {
            return self.invariant_violation(&batch, wakelock);
        }

        trace!(
            sub_hal = %batch.sub_hal_index,
            events = batch.len(),
            wakeup_count = batch.wakeup_count,
            "Dispatching batch"
        );
        self.queue.post_events(batch, wakelock);
        Ok(())
    }

    fn invariant_violation(
        &self,
        batch: &EventBatch,
        wakelock: ScopedWakelock,
    ) -> Result<(), DispatcherError> {
        let locked = wakelock.is_locked();
        let message = if locked {
            "No wake-up events posted but wake lock locked"
        } else {
            "Wake-up events posted while wake lock unlocked"
        };
        error!(
            sub_hal = %batch.sub_hal_index,
            wakeup_count = batch.wakeup_count,
            locked,
            "{message}"
        );
        proxy_metrics::record_wakelock_violation(batch.sub_hal_index);

        match self.mode {
            InvariantMode::Abort => panic!(
                "{message} for sub-hal w/ index {} (wakeup_count={})",
                batch.sub_hal_index, batch.wakeup_count
            ),
            InvariantMode::Report => Err(DispatcherError::WakelockMismatch {
                sub_hal: batch.sub_hal_index,
                wakeup_count: batch.wakeup_count,
                locked,
                wakelock,
            }),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
