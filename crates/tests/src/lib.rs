//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Contract smoke tests
//! - Configuration -> callback -> queue -> sink flows
//! - Concurrent sub-HALs sharing one wake lock
//! - The wake lock invariant's fatal path

use std::sync::Arc;

use contracts::{ControlSurface, DeliveryQueue, ProxyBlueprint, RefCountedWakeLock, SensorTable};
use dispatcher::{Dispatcher, InvariantMode, SubHalCallback};
use event_processor::{EventFilterPolicy, EventProcessor};

/// Proxy wiring built from a blueprint, one callback per sub-HAL
pub struct TestProxy {
    pub table: Arc<SensorTable>,
    pub wakelock: Arc<RefCountedWakeLock>,
    pub callbacks: Vec<SubHalCallback>,
}

impl TestProxy {
    /// Wire every configured sub-HAL to `queue`
    pub fn new(
        blueprint: &ProxyBlueprint,
        queue: Arc<dyn DeliveryQueue>,
        control: Arc<dyn ControlSurface>,
        mode: InvariantMode,
    ) -> Self {
        let table = Arc::new(blueprint.to_sensor_table());
        let policy = Arc::new(EventFilterPolicy::from_config(&blueprint.policy));
        let dispatcher = Arc::new(Dispatcher::new(queue).with_mode(mode));
        let wakelock = Arc::new(RefCountedWakeLock::new());

        let callbacks = blueprint
            .indexed_sub_hals()
            .map(|(index, _)| {
                let processor =
                    EventProcessor::new(index, table.clone(), policy.clone(), control.clone());
                SubHalCallback::new(processor, dispatcher.clone(), wakelock.clone())
            })
            .collect();

        Self {
            table,
            wakelock,
            callbacks,
        }
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{decode_handle, encode_handle, SubHalIndex};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_encode_decode_every_index() {
        for raw in 0..=usize::from(contracts::MAX_SUB_HAL_INDEX) {
            let index = SubHalIndex::new(raw).unwrap();
            let encoded = encode_handle(0x00AB_CDEF, index);
            assert!(encoded >= 0);
            assert_eq!(decode_handle(encoded), (index, 0x00AB_CDEF));
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{sub_hal_index_of, Event, EventBatch, ProxyBlueprint, SensorType};
    use dispatcher::{EventQueue, InvariantMode, PostOutcome, RecordingQueue};
    use event_processor::{MemoryNode, SysfsNode};

    use crate::TestProxy;

    fn blueprint(extra: &str) -> ProxyBlueprint {
        let content = format!(
            r#"
{extra}

[[sub_hals]]
name = "vendor"

[[sub_hals.sensors]]
handle = 1
name = "Glance"
sensor_type = "glance_gesture"
wake_up = true

[[sub_hals.sensors]]
handle = 2
name = "Pick Up"
sensor_type = "pick_up_gesture"
wake_up = true

[[sub_hals.sensors]]
handle = 3
name = "AOD Light"
sensor_type = {{ device_private = 65601 }}
type_string = "qti.sensor.lux_aod"

[[sub_hals]]
name = "dynamic"

[[sub_hals.sensors]]
handle = 1
name = "Accelerometer"
sensor_type = "accelerometer"

[[sub_hals.sensors]]
handle = 2
name = "Dynamic Meta"
sensor_type = "dynamic_sensor_meta"
"#
        );
        ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap()
    }

    #[tokio::test]
    async fn test_e2e_file_sink_and_aod_node() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("events.jsonl");
        let node = dir.path().join("aod_light_mode_set");
        let bp = blueprint(&format!(
            r#"
[policy]
aod_light_mode_node = "{}"

[[sinks]]
name = "file"
sink_type = "file"
params = {{ path = "{}" }}

[[sinks]]
name = "log"
sink_type = "log"
"#,
            node.display(),
            out.display()
        ));

        let queue = Arc::new(EventQueue::from_configs(&bp.sinks).unwrap());
        let control = Arc::new(SysfsNode::new(&bp.policy.aod_light_mode_node));
        let proxy = TestProxy::new(&bp, queue.clone(), control, InvariantMode::Abort);
        let vendor = &proxy.callbacks[0];
        let dynamic = &proxy.callbacks[1];

        // Glance detected, pick-up not detected, AOD light dark
        let outcome = vendor
            .post_events(
                &[
                    Event::scalar(1, SensorType::GlanceGesture, 2.0).at(10),
                    Event::scalar(2, SensorType::PickUpGesture, 1.0).at(11),
                    Event::scalar(3, SensorType::DevicePrivate(65601), 0.0).at(12),
                ],
                vendor.create_scoped_wakelock(true),
            )
            .unwrap();
        assert_eq!(
            outcome,
            PostOutcome::Dispatched {
                received: 3,
                forwarded: 2,
                wakeup_count: 1
            }
        );
        assert_eq!(std::fs::read_to_string(&node).unwrap(), "1");

        // AOD light bright, no wake-up events
        dynamic
            .post_events(
                &[
                    Event::scalar(1, SensorType::Accelerometer, 9.8).at(20),
                    Event::dynamic_sensor(2, 0x10, true).at(21),
                ],
                dynamic.create_scoped_wakelock(false),
            )
            .unwrap();
        vendor
            .post_events(
                &[Event::scalar(3, SensorType::DevicePrivate(65601), 1.0).at(30)],
                vendor.create_scoped_wakelock(false),
            )
            .unwrap();
        assert_eq!(std::fs::read_to_string(&node).unwrap(), "0");

        queue.shutdown().await;
        assert!(!proxy.wakelock.is_held());

        let batches: Vec<EventBatch> = std::fs::read_to_string(&out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(batches.len(), 3);

        let first = &batches[0];
        assert_eq!(first.wakeup_count, 1);
        let handles: Vec<i32> = first.events.iter().map(|e| e.sensor_handle).collect();
        assert_eq!(handles, vec![0x0000_0001, 0x0000_0003]);

        let second = &batches[1];
        assert_eq!(second.events[0].sensor_handle, 0x0100_0001);
        match second.events[1].payload {
            contracts::EventPayload::Dynamic(info) => {
                assert_eq!(info.sensor_handle, 0x0100_0010);
                assert!(info.connected);
            }
            ref other => panic!("unexpected payload: {other:?}"),
        }
        assert!(second
            .events
            .iter()
            .all(|e| sub_hal_index_of(e.sensor_handle).get() == 1));
    }

    #[test]
    fn test_stopped_threads_skip_and_release() {
        let bp = blueprint("");
        let queue = Arc::new(RecordingQueue::new());
        let proxy = TestProxy::new(
            &bp,
            queue.clone(),
            Arc::new(MemoryNode::new()),
            InvariantMode::Abort,
        );
        proxy.table.set_threads_running(false);

        let vendor = &proxy.callbacks[0];
        let outcome = vendor
            .post_events(
                &[Event::scalar(1, SensorType::GlanceGesture, 2.0)],
                vendor.create_scoped_wakelock(true),
            )
            .unwrap();

        assert_eq!(outcome, PostOutcome::Skipped);
        assert!(queue.is_empty());
        assert!(!proxy.wakelock.is_held());
    }

    #[test]
    fn test_aod_disabled_leaves_node_alone() {
        let bp = blueprint("[policy]\naod_enabled = false\n");
        let queue = Arc::new(RecordingQueue::new());
        let node = MemoryNode::new();
        let proxy = TestProxy::new(
            &bp,
            queue.clone(),
            Arc::new(node.clone()),
            InvariantMode::Abort,
        );

        let vendor = &proxy.callbacks[0];
        vendor
            .post_events(
                &[Event::scalar(3, SensorType::DevicePrivate(65601), 0.0)],
                vendor.create_scoped_wakelock(false),
            )
            .unwrap();

        assert!(node.writes().is_empty());
        assert_eq!(queue.take()[0].0.len(), 1);
    }
}

#[cfg(test)]
mod concurrency_tests {
    use std::sync::Arc;
    use std::thread;

    use contracts::{
        sub_hal_index_of, Event, ProxyBlueprint, SensorConfig, SensorType, SubHalConfig,
    };
    use dispatcher::{InvariantMode, PostOutcome, RecordingQueue};
    use event_processor::MemoryNode;
    use observability::ProcessingMetricsAggregator;

    use crate::TestProxy;

    const BATCHES: usize = 200;

    fn blueprint() -> ProxyBlueprint {
        let sub_hal = |name: &str| SubHalConfig {
            name: name.into(),
            sensors: vec![
                SensorConfig {
                    handle: 1,
                    name: "Proximity".into(),
                    sensor_type: SensorType::Proximity,
                    type_string: None,
                    wake_up: true,
                },
                SensorConfig {
                    handle: 2,
                    name: "Light".into(),
                    sensor_type: SensorType::Light,
                    type_string: None,
                    wake_up: false,
                },
            ],
        };
        ProxyBlueprint {
            version: Default::default(),
            policy: Default::default(),
            sub_hals: vec![sub_hal("first"), sub_hal("second")],
            sinks: vec![],
        }
    }

    #[test]
    fn test_two_sub_hals_in_parallel() {
        let bp = blueprint();
        let queue = Arc::new(RecordingQueue::new());
        let proxy = TestProxy::new(
            &bp,
            queue.clone(),
            Arc::new(MemoryNode::new()),
            InvariantMode::Report,
        );

        let workers: Vec<_> = proxy
            .callbacks
            .iter()
            .cloned()
            .map(|callback| {
                thread::spawn(move || {
                    let mut aggregator = ProcessingMetricsAggregator::new();
                    for i in 0..BATCHES {
                        // Every other batch carries a wake-up event
                        let wake = i % 2 == 0;
                        let mut events = vec![Event::scalar(2, SensorType::Light, i as f32)];
                        if wake {
                            events.push(Event::scalar(1, SensorType::Proximity, 0.0));
                        }
                        let outcome = callback
                            .post_events(&events, callback.create_scoped_wakelock(wake))
                            .unwrap();
                        if let PostOutcome::Dispatched {
                            received,
                            forwarded,
                            wakeup_count,
                        } = outcome
                        {
                            aggregator.update(
                                callback.sub_hal_index(),
                                received,
                                forwarded,
                                wakeup_count,
                            );
                        }
                    }
                    aggregator
                })
            })
            .collect();

        let mut total = ProcessingMetricsAggregator::new();
        for worker in workers {
            total.merge(&worker.join().unwrap());
        }

        assert_eq!(total.total_batches, 2 * BATCHES as u64);
        assert_eq!(total.wakeup_events, BATCHES as u64);
        assert_eq!(proxy.wakelock.count(), BATCHES);

        let delivered = queue.take();
        assert_eq!(delivered.len(), 2 * BATCHES);
        for (batch, wakelock) in &delivered {
            assert_eq!(wakelock.is_locked(), batch.wakeup_count > 0);
            assert!(batch
                .events
                .iter()
                .all(|e| sub_hal_index_of(e.sensor_handle) == batch.sub_hal_index));
        }

        drop(delivered);
        assert_eq!(proxy.wakelock.count(), 0);
    }
}

#[cfg(test)]
mod invariant_tests {
    use std::sync::Arc;

    use contracts::{Event, ProxyBlueprint, SensorConfig, SensorType, SubHalConfig};
    use dispatcher::{DispatcherError, InvariantMode, RecordingQueue};
    use event_processor::MemoryNode;

    use crate::TestProxy;

    fn proxy(mode: InvariantMode) -> (TestProxy, Arc<RecordingQueue>) {
        let bp = ProxyBlueprint {
            version: Default::default(),
            policy: Default::default(),
            sub_hals: vec![SubHalConfig {
                name: "vendor".into(),
                sensors: vec![SensorConfig {
                    handle: 7,
                    name: "Significant Motion".into(),
                    sensor_type: SensorType::SignificantMotion,
                    type_string: None,
                    wake_up: true,
                }],
            }],
            sinks: vec![],
        };
        let queue = Arc::new(RecordingQueue::new());
        let proxy = TestProxy::new(&bp, queue.clone(), Arc::new(MemoryNode::new()), mode);
        (proxy, queue)
    }

    #[test]
    #[should_panic(expected = "Wake-up events posted while wake lock unlocked")]
    fn test_abort_on_unlocked_wake_up_batch() {
        let (proxy, _queue) = proxy(InvariantMode::Abort);
        let callback = &proxy.callbacks[0];
        let _ = callback.post_events(
            &[Event::scalar(7, SensorType::SignificantMotion, 1.0)],
            callback.create_scoped_wakelock(false),
        );
    }

    #[test]
    #[should_panic(expected = "No wake-up events posted but wake lock locked")]
    fn test_abort_on_locked_batch_without_wake_ups() {
        let (proxy, _queue) = proxy(InvariantMode::Abort);
        let callback = &proxy.callbacks[0];
        let _ = callback.post_events(
            &[Event::scalar(0x99, SensorType::Light, 1.0)],
            callback.create_scoped_wakelock(true),
        );
    }

    #[test]
    fn test_report_mode_hands_guard_back() {
        let (proxy, queue) = proxy(InvariantMode::Report);
        let callback = &proxy.callbacks[0];

        let err = callback
            .post_events(
                &[Event::scalar(7, SensorType::SignificantMotion, 1.0)],
                callback.create_scoped_wakelock(false),
            )
            .unwrap_err();

        assert!(err.is_fatal());
        assert!(matches!(
            err,
            DispatcherError::WakelockMismatch {
                wakeup_count: 1,
                locked: false,
                ..
            }
        ));
        assert!(queue.is_empty());
        assert!(!proxy.wakelock.is_held());
    }
}
