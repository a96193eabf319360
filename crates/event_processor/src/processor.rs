//! EventProcessor - per-sub-HAL batch transform

use std::sync::Arc;

use contracts::{ControlSurface, Event, EventBatch, SensorRegistry, SubHalIndex};
use observability::metrics as proxy_metrics;
use tracing::{debug, trace, warn};

use crate::policy::{EventFilterPolicy, Verdict};

/// Annotates and filters the batches of one sub-HAL
///
/// Holds no mutable state: one instance per sub-HAL, each called from that
/// sub-HAL's own threads, all sharing the same registry.
#[derive(Clone)]
pub struct EventProcessor {
    sub_hal_index: SubHalIndex,
    registry: Arc<dyn SensorRegistry>,
    policy: Arc<EventFilterPolicy>,
    control: Arc<dyn ControlSurface>,
}

impl EventProcessor {
    /// Create a processor for the sub-HAL at `sub_hal_index`
    pub fn new(
        sub_hal_index: SubHalIndex,
        registry: Arc<dyn SensorRegistry>,
        policy: Arc<EventFilterPolicy>,
        control: Arc<dyn ControlSurface>,
    ) -> Self {
        Self {
            sub_hal_index,
            registry,
            policy,
            control,
        }
    }

    /// Sub-HAL this processor serves
    pub fn sub_hal_index(&self) -> SubHalIndex {
        self.sub_hal_index
    }

    /// Process one batch
    ///
    /// Returns `None` when there is nothing to do: the batch is empty or the
    /// client delivery threads are stopped. No side effects happen in that
    /// case.
    pub fn process(&self, events: &[Event]) -> Option<EventBatch> {
        if events.is_empty() {
            trace!(sub_hal = %self.sub_hal_index, "Empty batch skipped");
            return None;
        }
        if !self.registry.threads_running() {
            debug!(
                sub_hal = %self.sub_hal_index,
                events = events.len(),
                "Delivery threads stopped, batch skipped"
            );
            return None;
        }

        let mut wakeup_count = 0;
        let mut out = Vec::with_capacity(events.len());

        for event in events {
            let mut event = event.clone();
            event.encode_handles(self.sub_hal_index);

            let Some(info) = self.registry.sensor_info(event.sensor_handle) else {
                warn!(
                    sub_hal = %self.sub_hal_index,
                    handle = event.sensor_handle,
                    "Event for unregistered sensor forwarded unfiltered"
                );
                proxy_metrics::record_unknown_sensor(self.sub_hal_index);
                out.push(event);
                continue;
            };

            match self.policy.evaluate(&event, info) {
                Verdict::Drop(reason) => {
                    trace!(
                        sub_hal = %self.sub_hal_index,
                        handle = event.sensor_handle,
                        reason = reason.as_str(),
                        "Event dropped"
                    );
                    proxy_metrics::record_event_dropped(self.sub_hal_index, reason.as_str());
                    continue;
                }
                Verdict::ForwardAndSetLightMode { value } => self.set_light_mode(value),
                Verdict::Forward => {}
            }

            if info.is_wake_up() {
                wakeup_count += 1;
            }
            out.push(event);
        }

        proxy_metrics::record_batch_processed(
            self.sub_hal_index,
            events.len(),
            out.len(),
            wakeup_count,
        );

        Some(EventBatch {
            sub_hal_index: self.sub_hal_index,
            events: out,
            wakeup_count,
        })
    }

    /// Best-effort write of the AOD light mode; failures are swallowed
    fn set_light_mode(&self, value: bool) {
        let value = if value { "1" } else { "0" };
        match self.control.write_value(value) {
            Ok(()) => {
                trace!(node = %self.control.describe(), value, "Light mode written");
                proxy_metrics::record_control_write(true);
            }
            Err(e) => {
                debug!(node = %self.control.describe(), error = %e, "Light mode write failed");
                proxy_metrics::record_control_write(false);
            }
        }
    }
}

impl std::fmt::Debug for EventProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventProcessor")
            .field("sub_hal_index", &self.sub_hal_index)
            .field("policy", &self.policy)
            .field("control", &self.control.describe())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::MemoryNode;
    use contracts::{
        local_handle, sub_hal_index_of, EventPayload, SensorFlags, SensorInfo, SensorTable,
        SensorType,
    };

    const AOD_TYPE: SensorType = SensorType::DevicePrivate(0x10001);

    fn info(handle: i32, sensor_type: SensorType, wake_up: bool) -> SensorInfo {
        SensorInfo {
            sensor_handle: handle,
            name: format!("{sensor_type:?}"),
            sensor_type,
            type_as_string: if sensor_type == AOD_TYPE {
                "qti.sensor.lux_aod".to_string()
            } else {
                sensor_type.default_type_string()
            },
            flags: if wake_up {
                SensorFlags::WAKE_UP
            } else {
                SensorFlags::empty()
            },
        }
    }

    /// Sub-HAL 3 with: 1 accel, 2 glance (wake), 3 pick-up (wake), 4 aod, 5 dyn meta
    fn setup() -> (EventProcessor, Arc<SensorTable>, MemoryNode) {
        let index = SubHalIndex::new(3).unwrap();
        let table = Arc::new(SensorTable::new([
            info(index.encode(1), SensorType::Accelerometer, false),
            info(index.encode(2), SensorType::GlanceGesture, true),
            info(index.encode(3), SensorType::PickUpGesture, true),
            info(index.encode(4), AOD_TYPE, false),
            info(index.encode(5), SensorType::DynamicSensorMeta, false),
        ]));
        let node = MemoryNode::new();
        let processor = EventProcessor::new(
            index,
            table.clone(),
            Arc::new(EventFilterPolicy::default()),
            Arc::new(node.clone()),
        );
        (processor, table, node)
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let (processor, _, node) = setup();
        assert!(processor.process(&[]).is_none());
        assert!(node.writes().is_empty());
    }

    #[test]
    fn test_stopped_threads_is_noop() {
        let (processor, table, node) = setup();
        table.set_threads_running(false);

        let events = vec![
            Event::scalar(4, AOD_TYPE, 0.0),
            Event::scalar(2, SensorType::GlanceGesture, 2.0),
        ];
        assert!(processor.process(&events).is_none());
        assert!(node.writes().is_empty());
    }

    #[test]
    fn test_handles_encoded() {
        let (processor, _, _) = setup();
        let batch = processor
            .process(&[Event::scalar(1, SensorType::Accelerometer, 9.8)])
            .unwrap();

        assert_eq!(batch.events.len(), 1);
        let handle = batch.events[0].sensor_handle;
        assert_eq!(sub_hal_index_of(handle).get(), 3);
        assert_eq!(local_handle(handle), 1);
        assert_eq!(batch.sub_hal_index.get(), 3);
    }

    #[test]
    fn test_dynamic_meta_both_handles_encoded() {
        let (processor, _, _) = setup();
        let batch = processor
            .process(&[Event::dynamic_sensor(5, 0x42, true)])
            .unwrap();

        let event = &batch.events[0];
        assert_eq!(event.sensor_handle, 0x0300_0005);
        match event.payload {
            EventPayload::Dynamic(meta) => assert_eq!(meta.sensor_handle, 0x0300_0042),
            ref other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_gesture_filtering_and_wakeup_count() {
        let (processor, _, _) = setup();
        let events = vec![
            Event::scalar(2, SensorType::GlanceGesture, 2.0).at(1),
            Event::scalar(2, SensorType::GlanceGesture, 1.0).at(2),
            Event::scalar(3, SensorType::PickUpGesture, 0.0).at(3),
            Event::scalar(3, SensorType::PickUpGesture, 1.0).at(4),
            Event::scalar(1, SensorType::Accelerometer, 0.5).at(5),
        ];

        let batch = processor.process(&events).unwrap();
        let timestamps: Vec<_> = batch.events.iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![1, 3, 5]);
        // Dropped wake-up events are not counted
        assert_eq!(batch.wakeup_count, 2);
    }

    #[test]
    fn test_aod_light_mode_written_inverted() {
        let (processor, _, node) = setup();
        let events = vec![
            Event::scalar(4, AOD_TYPE, 0.0),
            Event::scalar(4, AOD_TYPE, 1.0),
        ];

        let batch = processor.process(&events).unwrap();
        assert_eq!(batch.events.len(), 2);
        assert_eq!(batch.wakeup_count, 0);
        assert_eq!(node.writes(), vec!["1".to_string(), "0".to_string()]);
    }

    #[test]
    fn test_aod_write_failure_is_swallowed() {
        let index = SubHalIndex::new(0).unwrap();
        let table = Arc::new(SensorTable::new([info(index.encode(4), AOD_TYPE, false)]));
        let processor = EventProcessor::new(
            index,
            table,
            Arc::new(EventFilterPolicy::default()),
            Arc::new(MemoryNode::failing()),
        );

        let batch = processor.process(&[Event::scalar(4, AOD_TYPE, 0.0)]).unwrap();
        assert_eq!(batch.events.len(), 1);
    }

    #[test]
    fn test_unknown_sensor_forwarded_not_counted() {
        let (processor, _, _) = setup();
        let batch = processor
            .process(&[Event::scalar(0x99, SensorType::GlanceGesture, 0.0)])
            .unwrap();
        assert_eq!(batch.events.len(), 1);
        assert_eq!(batch.events[0].sensor_handle, 0x0300_0099);
        assert_eq!(batch.wakeup_count, 0);
    }

    #[test]
    fn test_all_dropped_yields_empty_batch() {
        let (processor, _, _) = setup();
        let batch = processor
            .process(&[Event::scalar(2, SensorType::GlanceGesture, 0.0)])
            .unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.wakeup_count, 0);
    }
}
