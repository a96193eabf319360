//! Event - sub-HAL output
//!
//! Sensor events as produced by a sub-HAL and forwarded to the client.

use serde::{Deserialize, Serialize};

use crate::{SensorType, SubHalIndex};

/// Sensor event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Sensor handle (sub-HAL-local until encoded)
    pub sensor_handle: i32,

    /// Sensor type tag
    pub sensor_type: SensorType,

    /// Timestamp in nanoseconds
    #[serde(default)]
    pub timestamp: i64,

    /// Type-dependent payload
    pub payload: EventPayload,
}

/// Event payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPayload {
    /// Single value (gestures, light, proximity, ...)
    Scalar(f32),

    /// Three-axis reading
    Vec3(Vec3),

    /// Step counter value
    StepCount(u64),

    /// Dynamic sensor attached/detached
    Dynamic(DynamicSensorInfo),

    /// Raw values (fallback)
    Data(Vec<f32>),
}

/// Three-axis reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default)]
    pub status: i8,
}

/// Dynamic sensor meta-event payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamicSensorInfo {
    /// `true` when attached, `false` when detached
    pub connected: bool,

    /// Handle of the sensor that was attached/detached
    pub sensor_handle: i32,
}

impl Event {
    /// Create an event with a scalar payload.
    pub fn scalar(sensor_handle: i32, sensor_type: SensorType, value: f32) -> Self {
        Self {
            sensor_handle,
            sensor_type,
            timestamp: 0,
            payload: EventPayload::Scalar(value),
        }
    }

    /// Create a dynamic sensor meta-event describing `target`.
    pub fn dynamic_sensor(sensor_handle: i32, target: i32, connected: bool) -> Self {
        Self {
            sensor_handle,
            sensor_type: SensorType::DynamicSensorMeta,
            timestamp: 0,
            payload: EventPayload::Dynamic(DynamicSensorInfo {
                connected,
                sensor_handle: target,
            }),
        }
    }

    /// Set the timestamp.
    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Scalar payload value, if the payload is a scalar.
    pub fn scalar_value(&self) -> Option<f32> {
        match self.payload {
            EventPayload::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// Stamp `index` into every sensor handle this event carries.
    ///
    /// Dynamic sensor meta-events carry a second handle for the sensor they
    /// describe; both are encoded identically.
    pub fn encode_handles(&mut self, index: SubHalIndex) {
        self.sensor_handle = index.encode(self.sensor_handle);
        if self.sensor_type == SensorType::DynamicSensorMeta {
            if let EventPayload::Dynamic(ref mut meta) = self.payload {
                meta.sensor_handle = index.encode(meta.sensor_handle);
            }
        }
    }
}
