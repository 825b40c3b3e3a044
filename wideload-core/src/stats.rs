use crate::Outcome;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
#[cfg(feature = "serde")]
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::time::Duration;

/// Running totals over every outcome of a run.
///
/// `success_count + failure_count == total_invocations` holds after every [`record`](Self::record).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", cfg_eval::cfg_eval, serde_as)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunStatistics {
    pub total_invocations: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub total_latency_ms: i64,
    /// `total_latency_ms / total_invocations`, or `0.` before the first outcome.
    pub average_latency_ms: f64,
    #[cfg_attr(
        feature = "serde",
        serde_as(as = "Option<DurationSecondsWithFrac<f64>>")
    )]
    pub fastest: Option<Duration>,
    #[cfg_attr(
        feature = "serde",
        serde_as(as = "Option<DurationSecondsWithFrac<f64>>")
    )]
    pub slowest: Option<Duration>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &Outcome) {
        self.total_invocations += 1;
        if outcome.failed {
            self.failure_count += 1;
        } else {
            self.success_count += 1;
        }

        self.total_latency_ms = self.total_latency_ms.saturating_add(outcome.latency_ms());
        self.average_latency_ms = self.total_latency_ms as f64 / self.total_invocations as f64;

        self.fastest = Some(
            self.fastest
                .map_or(outcome.latency, |f| f.min(outcome.latency)),
        );
        self.slowest = Some(
            self.slowest
                .map_or(outcome.latency, |s| s.max(outcome.latency)),
        );
    }

    pub fn error_rate(&self) -> f64 {
        if self.total_invocations == 0 {
            0.
        } else {
            self.failure_count as f64 / self.total_invocations as f64
        }
    }
}
