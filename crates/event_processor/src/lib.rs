//! # Event Processor
//!
//! Post-processing of sub-HAL event batches.
//!
//! Responsibilities:
//! - Stamp the sub-HAL index into every sensor handle
//! - Apply the per-sensor-type filter policy
//! - Count surviving wake-up events
//!
//! ## Example
//!
//! ```ignore
//! use event_processor::{EventFilterPolicy, EventProcessor, SysfsNode};
//!
//! let processor = EventProcessor::new(
//!     index,
//!     registry,
//!     Arc::new(EventFilterPolicy::default()),
//!     Arc::new(SysfsNode::new("/sys/kernel/oplus_display/aod_light_mode_set")),
//! );
//!
//! if let Some(batch) = processor.process(&events) {
//!     // hand batch.events / batch.wakeup_count to the dispatcher
//! }
//! ```
//!
//! ## Latency
//!
//! The AOD light-mode write is synchronous on the calling sub-HAL thread.

mod control;
mod policy;
mod processor;

pub use control::{MemoryNode, SysfsNode};
pub use policy::{DropReason, EventFilterPolicy, FilterRule, Verdict};
pub use processor::EventProcessor;

pub use contracts::{Event, EventBatch, SubHalIndex};
