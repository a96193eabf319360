//! `replay` command implementation.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{
    ControlSurface, Event, ProxyBlueprint, RefCountedWakeLock, SensorRegistry, SensorTable,
    SubHalIndex,
};
use dispatcher::{Dispatcher, EventQueue, PostOutcome, SubHalCallback};
use event_processor::{EventFilterPolicy, EventProcessor, SysfsNode, Verdict};
use observability::ProcessingMetricsAggregator;
use tracing::{error, info, warn};

use crate::cli::ReplayArgs;
use crate::error::CliError;
use crate::replay::{self, ReplayStats, SubHalReplay};

/// Execute the `replay` command
pub async fn run_replay(args: &ReplayArgs) -> Result<()> {
    info!(
        config = %args.config.display(),
        events = %args.events.display(),
        "Loading replay inputs"
    );

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    if args.no_aod {
        info!("AOD light mode disabled from CLI");
        blueprint.policy.aod_enabled = false;
    }

    let batches = replay::load_batches(&args.events)
        .with_context(|| format!("Failed to load events from {}", args.events.display()))?;
    let groups = replay::group_by_sub_hal(&blueprint, batches)?;

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    info!(
        sub_hals = blueprint.sub_hals.len(),
        sensors = blueprint.sensor_count(),
        sinks = blueprint.sinks.len(),
        invariant_mode = ?args.invariant_mode,
        "Configuration loaded"
    );

    let stats = replay_groups(&blueprint, groups, args).await?;
    stats.print_summary();

    if stats.violations > 0 {
        return Err(CliError::InvariantViolations {
            count: stats.violations,
        }
        .into());
    }
    Ok(())
}

/// Shared pieces every sub-HAL callback is built from
struct ProxyContext {
    table: Arc<SensorTable>,
    policy: Arc<EventFilterPolicy>,
    control: Arc<dyn ControlSurface>,
    dispatcher: Arc<Dispatcher>,
    wakelock: Arc<RefCountedWakeLock>,
}

impl ProxyContext {
    fn callback(&self, index: SubHalIndex) -> SubHalCallback {
        let processor = EventProcessor::new(
            index,
            self.table.clone(),
            self.policy.clone(),
            self.control.clone(),
        );
        SubHalCallback::new(processor, self.dispatcher.clone(), self.wakelock.clone())
    }
}

async fn replay_groups(
    blueprint: &ProxyBlueprint,
    groups: Vec<SubHalReplay>,
    args: &ReplayArgs,
) -> Result<ReplayStats> {
    let queue = Arc::new(
        EventQueue::from_configs(&blueprint.sinks).context("Failed to create sinks")?,
    );
    let context = ProxyContext {
        table: Arc::new(blueprint.to_sensor_table()),
        policy: Arc::new(EventFilterPolicy::from_config(&blueprint.policy)),
        control: Arc::new(SysfsNode::new(&blueprint.policy.aod_light_mode_node)),
        dispatcher: Arc::new(Dispatcher::new(queue.clone()).with_mode(args.invariant_mode.into())),
        wakelock: Arc::new(RefCountedWakeLock::new()),
    };

    let start = Instant::now();
    let active_sub_hals = groups.len();

    let mut workers = Vec::with_capacity(groups.len());
    for group in groups {
        let callback = context.callback(group.index);
        let table = context.table.clone();
        let policy = context.policy.clone();
        workers.push(tokio::task::spawn_blocking(move || {
            replay_sub_hal(&callback, table.as_ref(), &policy, group.batches)
        }));
    }

    let mut processing = ProcessingMetricsAggregator::new();
    let mut violations = 0;
    for worker in workers {
        let (aggregator, count) = worker.await.context("Replay worker panicked")?;
        processing.merge(&aggregator);
        violations += count;
    }

    let sinks = queue.metrics();
    queue.shutdown().await;

    let outstanding_wakelocks = context.wakelock.count();
    if outstanding_wakelocks != 0 {
        warn!(count = outstanding_wakelocks, "Wake lock still held after shutdown");
    }

    Ok(ReplayStats {
        duration: start.elapsed(),
        active_sub_hals,
        violations,
        outstanding_wakelocks,
        processing,
        sinks,
    })
}

/// Post one sub-HAL's batches in order, the way the sub-HAL thread would
fn replay_sub_hal(
    callback: &SubHalCallback,
    registry: &dyn SensorRegistry,
    policy: &EventFilterPolicy,
    batches: Vec<Vec<Event>>,
) -> (ProcessingMetricsAggregator, u64) {
    let index = callback.sub_hal_index();
    let mut aggregator = ProcessingMetricsAggregator::new();
    let mut violations = 0;

    for events in batches {
        let lock = holds_wake_up_event(index, registry, policy, &events);
        let wakelock = callback.create_scoped_wakelock(lock);

        match callback.post_events(&events, wakelock) {
            Ok(PostOutcome::Dispatched {
                received,
                forwarded,
                wakeup_count,
            }) => aggregator.update(index, received, forwarded, wakeup_count),
            Ok(PostOutcome::Skipped) => aggregator.skip(),
            Err(e) => {
                error!(sub_hal = %index, error = %e, "Batch rejected");
                violations += 1;
            }
        }
    }

    (aggregator, violations)
}

/// Whether a raw batch carries a wake-up event that survives the policy
fn holds_wake_up_event(
    index: SubHalIndex,
    registry: &dyn SensorRegistry,
    policy: &EventFilterPolicy,
    events: &[Event],
) -> bool {
    events.iter().any(|event| {
        let mut event = event.clone();
        event.encode_handles(index);
        registry
            .sensor_info(event.sensor_handle)
            .is_some_and(|info| {
                info.is_wake_up() && !matches!(policy.evaluate(&event, info), Verdict::Drop(_))
            })
    })
}
