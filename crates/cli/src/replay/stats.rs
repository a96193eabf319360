//! Replay statistics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::ProcessingMetricsAggregator;

/// Statistics from a replay run
#[derive(Debug, Clone, Default)]
pub struct ReplayStats {
    /// Total duration of the replay
    pub duration: Duration,

    /// Number of sub-HALs that posted batches
    pub active_sub_hals: usize,

    /// Wake lock invariant violations reported
    pub violations: u64,

    /// Wake lock references still held after shutdown
    pub outstanding_wakelocks: usize,

    /// Processing figures merged across sub-HALs
    pub processing: ProcessingMetricsAggregator,

    /// Per-sink delivery counters
    pub sinks: Vec<(String, MetricsSnapshot)>,
}

impl ReplayStats {
    /// Received events per second
    pub fn events_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.processing.events_received as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Replay Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Active sub-HALs: {}", self.active_sub_hals);
        println!("   ├─ Events/s: {:.2}", self.events_per_sec());
        println!("   ├─ Wake lock violations: {}", self.violations);
        println!(
            "   └─ Wake lock references outstanding: {}",
            self.outstanding_wakelocks
        );

        println!("\n{}", self.processing.summary());

        if !self.sinks.is_empty() {
            println!("📤 Sinks");
            for (i, (name, m)) in self.sinks.iter().enumerate() {
                let prefix = if i == self.sinks.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: delivered {}, failed {}, dropped {}",
                    prefix, name, m.delivered_count, m.failure_count, m.dropped_count
                );
            }
        }

        println!();
    }
}
