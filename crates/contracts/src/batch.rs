//! EventBatch - processed output of one sub-HAL call

use serde::{Deserialize, Serialize};

use crate::{Event, SubHalIndex};

/// Filtered batch handed to the delivery queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBatch {
    /// Originating sub-HAL
    pub sub_hal_index: SubHalIndex,

    /// Surviving events, in input order, with encoded handles
    pub events: Vec<Event>,

    /// Number of surviving events from wake-up sensors
    pub wakeup_count: usize,
}

impl EventBatch {
    /// Number of events in the batch
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the batch has no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
