//! # Dispatcher
//!
//! Event delivery path of the proxy.
//!
//! Responsibilities:
//! - Run the per-sub-HAL callback: process, count wake-ups, dispatch
//! - Enforce the wake lock invariant before a batch leaves the sub-HAL
//! - Fan batches out to sinks without blocking the calling thread

pub mod callback;
pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod queue;
pub mod sinks;

pub use callback::{PostOutcome, SubHalCallback};
pub use contracts::{DataSink, DeliveryQueue, EventBatch, ScopedWakelock};
pub use dispatcher::{Dispatcher, InvariantMode};
pub use error::DispatcherError;
pub use handle::{Delivery, SinkHandle};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use queue::{EventQueue, RecordingQueue};
pub use sinks::{FileSink, FileSinkConfig, LogSink};
