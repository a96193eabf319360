//! SubHalCallback - entry point a sub-HAL posts its events through

use std::sync::Arc;

use contracts::{Event, ScopedWakelock, SubHalIndex, WakeLockRefCounter};
use event_processor::EventProcessor;
use tracing::trace;

use crate::dispatcher::Dispatcher;
use crate::error::DispatcherError;

/// Result of one `post_events` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    /// Nothing was dispatched (empty batch or delivery stopped)
    Skipped,
    /// A batch was handed to the queue
    Dispatched {
        received: usize,
        forwarded: usize,
        wakeup_count: usize,
    },
}

/// Per-sub-HAL callback
///
/// Owns the sub-HAL's processor and shares the dispatcher and the wake lock
/// counter with every other sub-HAL.
#[derive(Clone)]
pub struct SubHalCallback {
    processor: EventProcessor,
    dispatcher: Arc<Dispatcher>,
    wakelock: Arc<dyn WakeLockRefCounter>,
}

impl SubHalCallback {
    /// Create a callback
    pub fn new(
        processor: EventProcessor,
        dispatcher: Arc<Dispatcher>,
        wakelock: Arc<dyn WakeLockRefCounter>,
    ) -> Self {
        Self {
            processor,
            dispatcher,
            wakelock,
        }
    }

    /// Sub-HAL served by this callback
    pub fn sub_hal_index(&self) -> SubHalIndex {
        self.processor.sub_hal_index()
    }

    /// Create a guard against the shared wake lock
    pub fn create_scoped_wakelock(&self, lock: bool) -> ScopedWakelock {
        ScopedWakelock::new(self.wakelock.clone(), lock)
    }

    /// Process `events` and dispatch the result together with `wakelock`.
    ///
    /// When processing yields nothing the guard is dropped here, since no
    /// batch will carry it to the client.
    pub fn post_events(
        &self,
        events: &[Event],
        wakelock: ScopedWakelock,
    ) -> Result<PostOutcome, DispatcherError> {
        let Some(batch) = self.processor.process(events) else {
            trace!(sub_hal = %self.sub_hal_index(), "Nothing to post");
            return Ok(PostOutcome::Skipped);
        };

        let outcome = PostOutcome::Dispatched {
            received: events.len(),
            forwarded: batch.len(),
            wakeup_count: batch.wakeup_count,
        };
        self.dispatcher.dispatch(batch, wakelock)?;
        Ok(outcome)
    }
}

impl std::fmt::Debug for SubHalCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubHalCallback")
            .field("processor", &self.processor)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
