use std::time::Duration;

/// Result of a single measured workload invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub latency: Duration,
    pub failed: bool,
    pub worker: usize,
}

impl Outcome {
    pub fn success(worker: usize, latency: Duration) -> Self {
        Self {
            latency,
            failed: false,
            worker,
        }
    }

    pub fn failure(worker: usize, latency: Duration) -> Self {
        Self {
            latency,
            failed: true,
            worker,
        }
    }

    pub fn latency_ms(&self) -> i64 {
        i64::try_from(self.latency.as_millis()).unwrap_or(i64::MAX)
    }
}
