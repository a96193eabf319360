//! Per-sensor-type filter policy
//!
//! Rules are evaluated against the resolved descriptor of each event, after
//! handle encoding. Every rule runs in order: a drop ends evaluation, a
//! light-mode write from any rule is kept for a forwarded event.

use contracts::{Event, PolicyConfig, SensorInfo, SensorType};
use serde::{Deserialize, Serialize};

/// A single filter rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FilterRule {
    /// Forward events of `sensor_type` only when their scalar equals `detected`
    RequireDetected { sensor_type: SensorType, detected: f32 },

    /// Mirror the inverse of the event's boolean payload into the AOD
    /// light-mode control node; the event itself is forwarded
    AodLightMode { type_string: String },
}

/// Outcome of evaluating the policy for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Forward unchanged
    Forward,

    /// Drop the event
    Drop(DropReason),

    /// Forward, and write `value` to the AOD light-mode node
    ForwardAndSetLightMode { value: bool },
}

/// Why an event was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Gesture event that does not report a detection
    GestureNotDetected,
}

impl DropReason {
    /// Metric label
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GestureNotDetected => "gesture_not_detected",
        }
    }
}

impl FilterRule {
    fn evaluate(&self, event: &Event, info: &SensorInfo) -> Option<Verdict> {
        match self {
            Self::RequireDetected {
                sensor_type,
                detected,
            } => {
                if info.sensor_type != *sensor_type {
                    return None;
                }
                if event.scalar_value() == Some(*detected) {
                    Some(Verdict::Forward)
                } else {
                    Some(Verdict::Drop(DropReason::GestureNotDetected))
                }
            }
            Self::AodLightMode { type_string } => {
                if info.type_as_string != *type_string {
                    return None;
                }
                // Non-scalar payloads carry no mode; forward without a write.
                let verdict = match event.scalar_value() {
                    Some(value) => Verdict::ForwardAndSetLightMode { value: value == 0.0 },
                    None => Verdict::Forward,
                };
                Some(verdict)
            }
        }
    }
}

/// Event filter policy
#[derive(Debug, Clone, PartialEq)]
pub struct EventFilterPolicy {
    rules: Vec<FilterRule>,
}

impl EventFilterPolicy {
    /// Policy from an explicit rule list
    pub fn new(rules: Vec<FilterRule>) -> Self {
        Self { rules }
    }

    /// Policy that forwards everything
    pub fn pass_through() -> Self {
        Self { rules: Vec::new() }
    }

    /// Policy from configuration
    pub fn from_config(config: &PolicyConfig) -> Self {
        let mut rules = vec![
            FilterRule::RequireDetected {
                sensor_type: SensorType::GlanceGesture,
                detected: config.glance_detected,
            },
            FilterRule::RequireDetected {
                sensor_type: SensorType::PickUpGesture,
                detected: config.pick_up_detected,
            },
        ];
        if config.aod_enabled {
            rules.push(FilterRule::AodLightMode {
                type_string: config.aod_light_sensor_type.clone(),
            });
        }
        Self { rules }
    }

    /// Configured rules
    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    /// Decide what happens to `event`, whose descriptor is `info`
    pub fn evaluate(&self, event: &Event, info: &SensorInfo) -> Verdict {
        let mut verdict = Verdict::Forward;
        for rule in &self.rules {
            match rule.evaluate(event, info) {
                Some(drop @ Verdict::Drop(_)) => return drop,
                Some(light @ Verdict::ForwardAndSetLightMode { .. }) => verdict = light,
                Some(Verdict::Forward) | None => {}
            }
        }
        verdict
    }
}

impl Default for EventFilterPolicy {
    fn default() -> Self {
        Self::from_config(&PolicyConfig::default())
    }
}
