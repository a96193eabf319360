//! SinkHandle - manages a sink with isolated queue and worker task

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, trace, warn};

use contracts::{DataSink, EventBatch, ScopedWakelock};
use observability::metrics as proxy_metrics;

use crate::metrics::SinkMetrics;

/// A batch on its way to one sink
///
/// Every sink receiving the same batch shares one wake lock guard; the
/// reference is released when the last sink is done with the batch.
#[derive(Debug, Clone)]
pub struct Delivery {
    batch: Arc<EventBatch>,
    wakelock: Arc<ScopedWakelock>,
}

impl Delivery {
    /// Wrap a batch and the guard that keeps the device awake for it
    pub fn new(batch: EventBatch, wakelock: ScopedWakelock) -> Self {
        Self {
            batch: Arc::new(batch),
            wakelock: Arc::new(wakelock),
        }
    }

    /// Batch being delivered
    pub fn batch(&self) -> &EventBatch {
        &self.batch
    }

    /// Whether the shared guard holds a wake lock reference
    pub fn holds_wakelock(&self) -> bool {
        self.wakelock.is_locked()
    }
}

/// Handle to a running sink worker
pub struct SinkHandle {
    /// Sink name
    name: String,
    /// Channel to send deliveries to worker
    tx: mpsc::Sender<Delivery>,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Create a new SinkHandle and spawn the worker task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<S: DataSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Send a delivery to the sink (non-blocking, callable from any thread)
    ///
    /// Returns true if queued. A rejected delivery is dropped, giving back
    /// its share of the wake lock.
    pub fn try_send(&self, delivery: Delivery) -> bool {
        match self.tx.try_send(delivery) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(d)) => {
                self.metrics.inc_dropped_count();
                warn!(
                    sink = %self.name,
                    sub_hal = %d.batch.sub_hal_index,
                    events = d.batch.len(),
                    "Queue full, batch dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(sink = %self.name, "Sink worker closed unexpectedly");
                false
            }
        }
    }

    /// Shutdown the sink worker gracefully
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        // Drop sender to signal worker to stop
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(sink = %self.name, "SinkHandle shutdown complete");
    }
}

/// Worker task that consumes deliveries and writes to sink
#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn sink_worker<S: DataSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<Delivery>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "Sink worker started");

    while let Some(delivery) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match sink.write(delivery.batch()).await {
            Ok(()) => {
                trace!(
                    sink = %name,
                    sub_hal = %delivery.batch().sub_hal_index,
                    wakelock = delivery.holds_wakelock(),
                    "Batch written"
                );
                metrics.inc_delivered_count();
                proxy_metrics::record_batch_delivered(&name, true);
            }
            Err(e) => {
                metrics.inc_failure_count();
                proxy_metrics::record_batch_delivered(&name, false);
                error!(
                    sink = %name,
                    sub_hal = %delivery.batch().sub_hal_index,
                    error = %e,
                    "Write failed"
                );
                // Keep going: one bad batch must not stall the sink
            }
        }
        // Release this sink's share of the wake lock
        drop(delivery);
    }

    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Sink worker stopped");
}
