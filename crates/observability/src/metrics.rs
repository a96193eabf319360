//! Processing and delivery metrics
//!
//! Counters exported through the `metrics` facade, plus an in-memory
//! aggregator for run summaries.

use std::collections::BTreeMap;

use contracts::SubHalIndex;
use metrics::{counter, histogram};

/// Record one processed batch
pub fn record_batch_processed(
    sub_hal: SubHalIndex,
    received: usize,
    forwarded: usize,
    wakeup_events: usize,
) {
    let sub_hal = sub_hal.to_string();

    counter!("sensors_proxy_batches_processed_total", "sub_hal" => sub_hal.clone()).increment(1);
    counter!("sensors_proxy_events_received_total", "sub_hal" => sub_hal.clone())
        .increment(received as u64);
    counter!("sensors_proxy_events_forwarded_total", "sub_hal" => sub_hal.clone())
        .increment(forwarded as u64);
    if wakeup_events > 0 {
        counter!("sensors_proxy_wakeup_events_total", "sub_hal" => sub_hal)
            .increment(wakeup_events as u64);
    }
    histogram!("sensors_proxy_batch_size").record(received as f64);
}

/// Record an event removed by the filter policy
pub fn record_event_dropped(sub_hal: SubHalIndex, reason: &'static str) {
    counter!(
        "sensors_proxy_events_dropped_total",
        "sub_hal" => sub_hal.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// Record an event whose handle is not in the registry
pub fn record_unknown_sensor(sub_hal: SubHalIndex) {
    counter!("sensors_proxy_unknown_sensor_total", "sub_hal" => sub_hal.to_string()).increment(1);
}

/// Record a control node write attempt
pub fn record_control_write(success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("sensors_proxy_control_writes_total", "status" => status).increment(1);
}

/// Record a wake lock / wake-up count mismatch
pub fn record_wakelock_violation(sub_hal: SubHalIndex) {
    counter!(
        "sensors_proxy_wakelock_violations_total",
        "sub_hal" => sub_hal.to_string()
    )
    .increment(1);
}

/// Record a batch written (or not) by a sink
pub fn record_batch_delivered(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "sensors_proxy_batches_delivered_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Processing metrics aggregator
///
/// Aggregates in memory for statistics and summary output.
#[derive(Debug, Clone, Default)]
pub struct ProcessingMetricsAggregator {
    /// Batches processed
    pub total_batches: u64,

    /// Batches skipped (empty or delivery stopped)
    pub skipped_batches: u64,

    /// Events received from sub-HALs
    pub events_received: u64,

    /// Events forwarded after filtering
    pub events_forwarded: u64,

    /// Surviving wake-up events
    pub wakeup_events: u64,

    /// Batch size statistics (received events)
    pub batch_size_stats: RunningStats,

    /// Events forwarded per sub-HAL
    pub forwarded_per_sub_hal: BTreeMap<SubHalIndex, u64>,
}

impl ProcessingMetricsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one processed batch
    pub fn update(
        &mut self,
        sub_hal: SubHalIndex,
        received: usize,
        forwarded: usize,
        wakeup_events: usize,
    ) {
        self.total_batches += 1;
        self.events_received += received as u64;
        self.events_forwarded += forwarded as u64;
        self.wakeup_events += wakeup_events as u64;
        self.batch_size_stats.push(received as f64);
        *self.forwarded_per_sub_hal.entry(sub_hal).or_insert(0) += forwarded as u64;
    }

    /// Account one skipped batch
    pub fn skip(&mut self) {
        self.skipped_batches += 1;
    }

    /// Fold another aggregator into this one
    pub fn merge(&mut self, other: &Self) {
        self.total_batches += other.total_batches;
        self.skipped_batches += other.skipped_batches;
        self.events_received += other.events_received;
        self.events_forwarded += other.events_forwarded;
        self.wakeup_events += other.wakeup_events;
        self.batch_size_stats.merge(&other.batch_size_stats);
        for (sub_hal, count) in &other.forwarded_per_sub_hal {
            *self.forwarded_per_sub_hal.entry(*sub_hal).or_insert(0) += count;
        }
    }

    /// Build summary report
    pub fn summary(&self) -> MetricsSummary {
        let dropped = self.events_received.saturating_sub(self.events_forwarded);
        MetricsSummary {
            total_batches: self.total_batches,
            skipped_batches: self.skipped_batches,
            events_received: self.events_received,
            events_forwarded: self.events_forwarded,
            events_dropped: dropped,
            wakeup_events: self.wakeup_events,
            drop_rate: if self.events_received > 0 {
                dropped as f64 / self.events_received as f64 * 100.0
            } else {
                0.0
            },
            batch_size: StatsSummary::from(&self.batch_size_stats),
            forwarded_per_sub_hal: self.forwarded_per_sub_hal.clone(),
        }
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_batches: u64,
    pub skipped_batches: u64,
    pub events_received: u64,
    pub events_forwarded: u64,
    pub events_dropped: u64,
    pub wakeup_events: u64,
    pub drop_rate: f64,
    pub batch_size: StatsSummary,
    pub forwarded_per_sub_hal: BTreeMap<SubHalIndex, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Processing Summary ===")?;
        writeln!(
            f,
            "Batches: {} processed, {} skipped",
            self.total_batches, self.skipped_batches
        )?;
        writeln!(f, "Events received: {}", self.events_received)?;
        writeln!(f, "Events forwarded: {}", self.events_forwarded)?;
        writeln!(
            f,
            "Events dropped: {} ({:.2}%)",
            self.events_dropped, self.drop_rate
        )?;
        writeln!(f, "Wake-up events: {}", self.wakeup_events)?;
        writeln!(f, "Batch size: {}", self.batch_size)?;

        if !self.forwarded_per_sub_hal.is_empty() {
            writeln!(f, "Forwarded per sub-HAL:")?;
            for (sub_hal, count) in &self.forwarded_per_sub_hal {
                writeln!(f, "  {}: {}", sub_hal, count)?;
            }
        }

        Ok(())
    }
}

/// Summary of a `RunningStats`
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Combine with statistics gathered elsewhere (Chan et al.)
    pub fn merge(&mut self, other: &RunningStats) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }

        let count = self.count + other.count;
        let delta = other.mean - self.mean;
        self.mean += delta * other.count as f64 / count as f64;
        self.m2 += other.m2
            + delta * delta * (self.count as f64 * other.count as f64) / count as f64;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.count = count;
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }
}
