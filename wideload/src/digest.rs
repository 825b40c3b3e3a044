use hdrhistogram::{CreationError, Histogram};
use std::time::Duration;
use wideload_core::LatencySummary;

/// One hour, in microseconds. Longer latencies saturate.
const MAX_TRACKED_MICROS: u64 = 3_600_000_000;
const SIGNIFICANT_FIGURES: u8 = 3;

/// Latency quantiles over every outcome of a run, at microsecond resolution.
pub(crate) struct LatencyDigest {
    histogram: Histogram<u64>,
}

impl LatencyDigest {
    pub fn new() -> Result<Self, CreationError> {
        let histogram = Histogram::new_with_bounds(1, MAX_TRACKED_MICROS, SIGNIFICANT_FIGURES)?;
        Ok(Self { histogram })
    }

    pub fn insert(&mut self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.histogram.saturating_record(micros.max(1));
    }

    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn quantile(&self, quantile: f64) -> Duration {
        if self.histogram.is_empty() {
            return Duration::ZERO;
        }
        Duration::from_micros(self.histogram.value_at_quantile(quantile))
    }

    pub fn summary(&self) -> LatencySummary {
        LatencySummary {
            p50: self.quantile(0.5),
            p90: self.quantile(0.9),
            p99: self.quantile(0.99),
        }
    }
}
