//! Sensor descriptors
//!
//! Static per-handle information the registry hands back to the processor.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Base of the vendor-defined sensor type range.
pub const DEVICE_PRIVATE_BASE: i32 = 0x10000;

/// Sensor type tag
///
/// Numeric values match the platform sensor type constants so that raw
/// values read from a sub-HAL map one-to-one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Accelerometer,
    MagneticField,
    Gyroscope,
    Light,
    Pressure,
    Proximity,
    Gravity,
    LinearAcceleration,
    RotationVector,
    SignificantMotion,
    StepDetector,
    StepCounter,
    WakeGesture,
    GlanceGesture,
    PickUpGesture,
    WristTiltGesture,
    DynamicSensorMeta,
    AdditionalInfo,
    /// Vendor-specific type (value >= [`DEVICE_PRIVATE_BASE`])
    DevicePrivate(i32),
}

impl SensorType {
    /// Map a raw platform type value. Unknown non-vendor values yield `None`.
    pub fn from_raw(value: i32) -> Option<Self> {
        let kind = match value {
            1 => Self::Accelerometer,
            2 => Self::MagneticField,
            4 => Self::Gyroscope,
            5 => Self::Light,
            6 => Self::Pressure,
            8 => Self::Proximity,
            9 => Self::Gravity,
            10 => Self::LinearAcceleration,
            11 => Self::RotationVector,
            17 => Self::SignificantMotion,
            18 => Self::StepDetector,
            19 => Self::StepCounter,
            23 => Self::WakeGesture,
            24 => Self::GlanceGesture,
            25 => Self::PickUpGesture,
            26 => Self::WristTiltGesture,
            32 => Self::DynamicSensorMeta,
            33 => Self::AdditionalInfo,
            v if v >= DEVICE_PRIVATE_BASE => Self::DevicePrivate(v),
            _ => return None,
        };
        Some(kind)
    }

    /// Raw platform type value.
    pub fn as_raw(self) -> i32 {
        match self {
            Self::Accelerometer => 1,
            Self::MagneticField => 2,
            Self::Gyroscope => 4,
            Self::Light => 5,
            Self::Pressure => 6,
            Self::Proximity => 8,
            Self::Gravity => 9,
            Self::LinearAcceleration => 10,
            Self::RotationVector => 11,
            Self::SignificantMotion => 17,
            Self::StepDetector => 18,
            Self::StepCounter => 19,
            Self::WakeGesture => 23,
            Self::GlanceGesture => 24,
            Self::PickUpGesture => 25,
            Self::WristTiltGesture => 26,
            Self::DynamicSensorMeta => 32,
            Self::AdditionalInfo => 33,
            Self::DevicePrivate(v) => v,
        }
    }

    /// Default type string, as reported by sensors that do not override it.
    pub fn default_type_string(self) -> String {
        let name = match self {
            Self::Accelerometer => "accelerometer",
            Self::MagneticField => "magnetic_field",
            Self::Gyroscope => "gyroscope",
            Self::Light => "light",
            Self::Pressure => "pressure",
            Self::Proximity => "proximity",
            Self::Gravity => "gravity",
            Self::LinearAcceleration => "linear_acceleration",
            Self::RotationVector => "rotation_vector",
            Self::SignificantMotion => "significant_motion",
            Self::StepDetector => "step_detector",
            Self::StepCounter => "step_counter",
            Self::WakeGesture => "wake_gesture",
            Self::GlanceGesture => "glance_gesture",
            Self::PickUpGesture => "pick_up_gesture",
            Self::WristTiltGesture => "wrist_tilt_gesture",
            Self::DynamicSensorMeta => "dynamic_sensor_meta",
            Self::AdditionalInfo => "additional_info",
            Self::DevicePrivate(v) => return format!("device_private.{v:#x}"),
        };
        format!("android.sensor.{name}")
    }
}

bitflags! {
    /// Sensor descriptor flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SensorFlags: u32 {
        /// Events must keep the device awake until delivered
        const WAKE_UP = 1;
        const ON_CHANGE_MODE = 2;
        const ONE_SHOT_MODE = 4;
        const DATA_INJECTION = 0x10;
        const DYNAMIC_SENSOR = 0x20;
        const ADDITIONAL_INFO = 0x40;
    }
}

/// Static sensor descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorInfo {
    /// Encoded sensor handle (registry key)
    pub sensor_handle: i32,

    /// Human-readable name
    pub name: String,

    /// Sensor type tag
    pub sensor_type: SensorType,

    /// Type string, used to match vendor-specific sensors
    pub type_as_string: String,

    /// Descriptor flags
    pub flags: SensorFlags,
}

impl SensorInfo {
    /// Whether events from this sensor must keep the device awake.
    #[inline]
    pub fn is_wake_up(&self) -> bool {
        self.flags.contains(SensorFlags::WAKE_UP)
    }
}
