//! SensorRegistry - read-mostly sensor lookup
//!
//! The registry is populated during sub-HAL registration and only read while
//! events flow.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::SensorInfo;

/// Registry capability used by the event processor
///
/// Implementations must be safe to call concurrently from every sub-HAL
/// thread.
pub trait SensorRegistry: Send + Sync {
    /// Look up a sensor by its *encoded* handle.
    fn sensor_info(&self, handle: i32) -> Option<&SensorInfo>;

    /// Whether the client delivery threads are running.
    fn threads_running(&self) -> bool;
}

/// Immutable handle -> descriptor table
#[derive(Debug)]
pub struct SensorTable {
    sensors: HashMap<i32, SensorInfo>,
    threads_running: AtomicBool,
}

impl SensorTable {
    /// Create table from descriptors (keyed by their encoded handle)
    pub fn new(sensors: impl IntoIterator<Item = SensorInfo>) -> Self {
        Self {
            sensors: sensors
                .into_iter()
                .map(|info| (info.sensor_handle, info))
                .collect(),
            threads_running: AtomicBool::new(true),
        }
    }

    /// Flip the delivery thread state
    pub fn set_threads_running(&self, running: bool) {
        self.threads_running.store(running, Ordering::Release);
    }

    /// Number of registered sensors
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    /// Whether no sensors are registered
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Iterate over all descriptors
    pub fn iter(&self) -> impl Iterator<Item = &SensorInfo> {
        self.sensors.values()
    }
}

impl SensorRegistry for SensorTable {
    #[inline]
    fn sensor_info(&self, handle: i32) -> Option<&SensorInfo> {
        self.sensors.get(&handle)
    }

    #[inline]
    fn threads_running(&self) -> bool {
        self.threads_running.load(Ordering::Acquire)
    }
}
