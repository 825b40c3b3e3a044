use crate::{RunConfig, RunStatistics};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
#[cfg(feature = "serde")]
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::fmt;
use std::time::Duration;
use tracing::info;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StopReason {
    /// Every worker finished on its own (unthrottled single pass).
    Completed,
    /// The configured duration elapsed.
    DurationElapsed,
    /// An interrupt signal was received.
    Interrupted,
    /// A caller invoked stop explicitly.
    Requested,
    /// A worker failed its one-time setup and the run was aborted.
    SetupFailed,
    /// A worker task panicked and the run was aborted.
    WorkerPanicked,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::Completed => "completed",
            StopReason::DurationElapsed => "duration elapsed",
            StopReason::Interrupted => "interrupted",
            StopReason::Requested => "stop requested",
            StopReason::SetupFailed => "setup failed",
            StopReason::WorkerPanicked => "worker panicked",
        };
        f.write_str(s)
    }
}

/// Latency quantiles over every measured invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", cfg_eval::cfg_eval, serde_as)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LatencySummary {
    #[cfg_attr(feature = "serde", serde_as(as = "DurationSecondsWithFrac<f64>"))]
    pub p50: Duration,
    #[cfg_attr(feature = "serde", serde_as(as = "DurationSecondsWithFrac<f64>"))]
    pub p90: Duration,
    #[cfg_attr(feature = "serde", serde_as(as = "DurationSecondsWithFrac<f64>"))]
    pub p99: Duration,
}

/// Final summary of one run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", cfg_eval::cfg_eval, serde_as)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunReport {
    pub workload: String,
    pub stats: RunStatistics,
    pub latency: LatencySummary,
    #[cfg_attr(feature = "serde", serde_as(as = "DurationSecondsWithFrac<f64>"))]
    pub elapsed: Duration,
    pub stop_reason: StopReason,
    pub config: RunConfig,
}

impl RunReport {
    /// Measured invocations per second over the whole run.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0. {
            self.stats.total_invocations as f64 / secs
        } else {
            0.
        }
    }

    /// Emit the report through `tracing`. Safe to call any number of times.
    pub fn log(&self) {
        info!(
            workload = %self.workload,
            total = self.stats.total_invocations,
            success = self.stats.success_count,
            failure = self.stats.failure_count,
            avg_latency_ms = self.stats.average_latency_ms,
            "Run finished ({})",
            self.stop_reason
        );
        info!("{self}");
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: total={} success={} failure={} avg={:.2}ms p50={:?} p90={:?} p99={:?} elapsed={} throughput={:.2}/s",
            self.workload,
            self.stats.total_invocations,
            self.stats.success_count,
            self.stats.failure_count,
            self.stats.average_latency_ms,
            self.latency.p50,
            self.latency.p90,
            self.latency.p99,
            humantime::format_duration(truncate_to_millis(self.elapsed)),
            self.throughput(),
        )
    }
}

fn truncate_to_millis(dur: Duration) -> Duration {
    Duration::from_millis(dur.as_millis() as u64)
}
