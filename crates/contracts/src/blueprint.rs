//! ProxyBlueprint - Config Loader output
//!
//! Describes the proxy: filter policy, sub-HALs and their sensors, delivery
//! sinks.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::{SensorFlags, SensorInfo, SensorTable, SensorType, SubHalIndex};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete proxy configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Event filter policy settings
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Sub-HALs, in registration order (position = sub-HAL index)
    pub sub_hals: Vec<SubHalConfig>,

    /// Delivery sinks
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Filter policy settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Glance gesture scalar that means "detected"
    #[serde(default = "default_glance_detected")]
    pub glance_detected: f32,

    /// Pick-up gesture scalar that means "detected"
    #[serde(default = "default_pick_up_detected")]
    pub pick_up_detected: f32,

    /// Whether the AOD light-mode side effect is enabled
    #[serde(default = "default_true")]
    pub aod_enabled: bool,

    /// Type string of the vendor AOD ambient light sensor
    #[serde(default = "default_aod_light_sensor_type")]
    pub aod_light_sensor_type: String,

    /// Kernel node toggled by AOD light sensor events
    #[serde(default = "default_aod_light_mode_node")]
    pub aod_light_mode_node: PathBuf,
}

fn default_glance_detected() -> f32 {
    2.0
}

fn default_pick_up_detected() -> f32 {
    0.0
}

fn default_true() -> bool {
    true
}

fn default_aod_light_sensor_type() -> String {
    "qti.sensor.lux_aod".to_string()
}

fn default_aod_light_mode_node() -> PathBuf {
    PathBuf::from("/sys/kernel/oplus_display/aod_light_mode_set")
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            glance_detected: default_glance_detected(),
            pick_up_detected: default_pick_up_detected(),
            aod_enabled: true,
            aod_light_sensor_type: default_aod_light_sensor_type(),
            aod_light_mode_node: default_aod_light_mode_node(),
        }
    }
}

/// Sub-HAL configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubHalConfig {
    /// Unique name
    pub name: String,

    /// Sensors registered by this sub-HAL
    #[serde(default)]
    pub sensors: Vec<SensorConfig>,
}

/// Sensor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Sub-HAL-local handle (low 24 bits only)
    pub handle: i32,

    /// Human-readable name
    pub name: String,

    /// Sensor type
    pub sensor_type: SensorType,

    /// Type string override (vendor sensors)
    #[serde(default)]
    pub type_string: Option<String>,

    /// Wake-up sensor
    #[serde(default)]
    pub wake_up: bool,
}

impl SensorConfig {
    /// Build the registry descriptor for this sensor under `index`
    pub fn to_sensor_info(&self, index: SubHalIndex) -> SensorInfo {
        let mut flags = SensorFlags::empty();
        if self.wake_up {
            flags |= SensorFlags::WAKE_UP;
        }
        if self.sensor_type == SensorType::DynamicSensorMeta {
            flags |= SensorFlags::DYNAMIC_SENSOR;
        }

        SensorInfo {
            sensor_handle: index.encode(self.handle),
            name: self.name.clone(),
            sensor_type: self.sensor_type,
            type_as_string: self
                .type_string
                .clone()
                .unwrap_or_else(|| self.sensor_type.default_type_string()),
            flags,
        }
    }
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log output
    Log,
    /// JSON lines file output
    File,
}

impl ProxyBlueprint {
    /// Sub-HALs paired with their index.
    ///
    /// Sub-HALs beyond the addressable range are skipped; validation rejects
    /// such configurations before this is reached.
    pub fn indexed_sub_hals(&self) -> impl Iterator<Item = (SubHalIndex, &SubHalConfig)> {
        self.sub_hals
            .iter()
            .enumerate()
            .filter_map(|(i, sub_hal)| SubHalIndex::new(i).ok().map(|index| (index, sub_hal)))
    }

    /// Build the sensor registry, keyed by encoded handle
    pub fn to_sensor_table(&self) -> SensorTable {
        SensorTable::new(self.indexed_sub_hals().flat_map(|(index, sub_hal)| {
            sub_hal
                .sensors
                .iter()
                .map(move |sensor| sensor.to_sensor_info(index))
        }))
    }

    /// Find a sub-HAL by name
    pub fn sub_hal_index(&self, name: &str) -> Option<SubHalIndex> {
        self.indexed_sub_hals()
            .find(|(_, sub_hal)| sub_hal.name == name)
            .map(|(index, _)| index)
    }

    /// Total number of sensors
    pub fn sensor_count(&self) -> usize {
        self.sub_hals.iter().map(|s| s.sensors.len()).sum()
    }
}
