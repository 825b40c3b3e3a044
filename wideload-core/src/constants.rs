use std::time::Duration;

/// Default capacity of the bounded outcome channel between workers and the aggregator.
pub const DEFAULT_OUTCOME_BUFFER: usize = 10_000;

/// Upper bound on the startup jitter any single worker sleeps before its first iteration.
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_secs(1);

/// Jitter bound grows by this step per worker index, wrapping every [`JITTER_SLOTS`] workers.
pub const JITTER_STEP: Duration = Duration::from_millis(100);
pub const JITTER_SLOTS: usize = 10;

/// Above this per-worker rate the tick interval would round down to zero microseconds.
pub const MAX_PER_WORKER_QPS: i64 = 1_000_000;

pub const MICROS_PER_SECOND: u64 = 1_000_000;
