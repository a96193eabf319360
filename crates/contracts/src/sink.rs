//! Delivery interfaces
//!
//! `DeliveryQueue` is what the dispatcher hands batches to. `DataSink` is
//! what a queue worker writes delivered batches into.

use crate::{ContractError, EventBatch, ScopedWakelock};

/// Delivery queue capability
///
/// Takes ownership of the wake lock guard together with the batch. The queue
/// releases the guard once delivery is guaranteed to proceed, including when
/// it gives up on the batch.
pub trait DeliveryQueue: Send + Sync {
    /// Hand a batch to the queue. Must not block on other sub-HALs.
    fn post_events(&self, batch: EventBatch, wakelock: ScopedWakelock);
}

/// Data output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(DataSink: Send)]
pub trait LocalDataSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write a delivered batch
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, batch: &EventBatch) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
