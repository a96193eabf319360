//! Delivery queues
//!
//! `EventQueue` fans batches out to sink workers. `RecordingQueue` keeps
//! them in memory for tests and simulation.

use std::sync::{Mutex, PoisonError, RwLock};

use contracts::{DeliveryQueue, EventBatch, ScopedWakelock, SinkConfig, SinkType};
use tracing::{debug, info, instrument, warn};

use crate::error::DispatcherError;
use crate::handle::{Delivery, SinkHandle};
use crate::metrics::MetricsSnapshot;
use crate::sinks::{FileSink, LogSink};

/// Delivery queue backed by per-sink worker tasks
///
/// `post_events` never waits on a sink: each sink has its own bounded
/// channel and a full channel drops the batch for that sink only.
pub struct EventQueue {
    handles: RwLock<Vec<SinkHandle>>,
}

impl EventQueue {
    /// Create a queue over already spawned sink handles
    pub fn with_handles(handles: Vec<SinkHandle>) -> Self {
        Self {
            handles: RwLock::new(handles),
        }
    }

    /// Build sinks from configuration and spawn their workers
    ///
    /// Must be called from within a Tokio runtime.
    #[instrument(
        name = "event_queue_from_configs",
        skip(configs),
        fields(sink_count = configs.len())
    )]
    pub fn from_configs(configs: &[SinkConfig]) -> Result<Self, DispatcherError> {
        let mut handles = Vec::with_capacity(configs.len());
        for config in configs {
            handles.push(create_sink_handle(config)?);
        }
        info!(sinks = handles.len(), "Event queue started");
        Ok(Self::with_handles(handles))
    }

    /// Number of live sinks
    pub fn sink_count(&self) -> usize {
        self.handles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Stop accepting batches and drain every sink
    #[instrument(name = "event_queue_shutdown", skip(self))]
    pub async fn shutdown(&self) {
        let handles = std::mem::take(
            &mut *self
                .handles
                .write()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            handle.shutdown().await;
        }
        info!("Event queue shutdown complete");
    }
}

impl DeliveryQueue for EventQueue {
    fn post_events(&self, batch: EventBatch, wakelock: ScopedWakelock) {
        let handles = self.handles.read().unwrap_or_else(PoisonError::into_inner);
        if handles.is_empty() {
            warn!(
                sub_hal = %batch.sub_hal_index,
                events = batch.len(),
                "No sinks available, batch discarded"
            );
            return;
        }

        let delivery = Delivery::new(batch, wakelock);
        for handle in handles.iter() {
            handle.try_send(delivery.clone());
        }
    }
}

impl std::fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("sinks", &self.sink_count())
            .finish()
    }
}

/// Create a SinkHandle from configuration
fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, DispatcherError> {
    debug!(sink = %config.name, sink_type = ?config.sink_type, "Creating sink");
    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::new(&config.name);
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
    }
}

/// In-memory delivery queue
///
/// Keeps every batch together with its guard until `take` is called.
#[derive(Debug, Default)]
pub struct RecordingQueue {
    batches: Mutex<Vec<(EventBatch, ScopedWakelock)>>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded batches
    pub fn len(&self) -> usize {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return everything recorded so far
    pub fn take(&self) -> Vec<(EventBatch, ScopedWakelock)> {
        std::mem::take(
            &mut *self
                .batches
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }
}

impl DeliveryQueue for RecordingQueue {
    fn post_events(&self, batch: EventBatch, wakelock: ScopedWakelock) {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((batch, wakelock));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Event, RefCountedWakeLock, SensorType, SubHalIndex};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn batch(wakeup_count: usize) -> EventBatch {
        EventBatch {
            sub_hal_index: SubHalIndex::new(1).unwrap(),
            events: vec![Event::scalar(0x0100_0002, SensorType::Proximity, 0.0)],
            wakeup_count,
        }
    }

    fn log_config(name: &str) -> SinkConfig {
        SinkConfig {
            name: name.to_string(),
            sink_type: SinkType::Log,
            queue_capacity: 16,
            params: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_fan_out_releases_after_all_sinks() {
        let queue = EventQueue::from_configs(&[log_config("a"), log_config("b")]).unwrap();
        let lock = Arc::new(RefCountedWakeLock::new());

        queue.post_events(batch(1), ScopedWakelock::new(lock.clone(), true));
        assert!(lock.is_held());

        queue.shutdown().await;
        assert!(!lock.is_held());
        assert_eq!(queue.sink_count(), 0);
    }

    #[tokio::test]
    async fn test_metrics_per_sink() {
        let queue = EventQueue::from_configs(&[log_config("log")]).unwrap();
        let lock = Arc::new(RefCountedWakeLock::new());
        for _ in 0..3 {
            queue.post_events(batch(0), ScopedWakelock::new(lock.clone(), false));
        }

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let metrics = queue.metrics();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].0, "log");
        assert_eq!(metrics[0].1.delivered_count, 3);

        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_closed_queue_discards_and_releases() {
        let queue = EventQueue::from_configs(&[log_config("log")]).unwrap();
        queue.shutdown().await;

        let lock = Arc::new(RefCountedWakeLock::new());
        queue.post_events(batch(1), ScopedWakelock::new(lock.clone(), true));
        assert!(!lock.is_held());
    }

    #[test]
    fn test_recording_queue_keeps_guard() {
        let queue = RecordingQueue::new();
        let lock = Arc::new(RefCountedWakeLock::new());
        queue.post_events(batch(1), ScopedWakelock::new(lock.clone(), true));

        assert_eq!(queue.len(), 1);
        assert!(lock.is_held());
        drop(queue.take());
        assert!(!lock.is_held());
        assert!(queue.is_empty());
    }
}
