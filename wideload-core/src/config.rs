use crate::{
    ConfigError, DEFAULT_MAX_JITTER, DEFAULT_OUTCOME_BUFFER, MAX_PER_WORKER_QPS,
    MICROS_PER_SECOND,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
#[cfg(feature = "serde")]
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::time::Duration;

/// How the configured QPS is shared between workers.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RateTopology {
    /// Every worker has its own timer ticking at `qps`. The aggregate target rate is
    /// `concurrency * qps`.
    #[default]
    PerWorker,

    /// All workers draw from a single limiter of `qps` permits per second. The aggregate
    /// target rate is `qps` regardless of concurrency.
    Shared,
}

/// Settings for a single load-generation run.
///
/// # Example
/// ```
/// use wideload_core::RunConfig;
/// use std::time::Duration;
///
/// let config = RunConfig::new()
///     .concurrency(3)
///     .qps(5)
///     .duration(Duration::from_secs(2));
///
/// assert_eq!(config.target_rate(), Some(15.));
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", cfg_eval::cfg_eval, serde_as)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct RunConfig {
    /// Number of workers. Values below 1 are raised to 1 when validated.
    pub concurrency: usize,

    /// Invocations per second, per worker (or in total for [`RateTopology::Shared`]).
    /// `qps <= 0` runs each worker exactly once without throttling.
    pub qps: i64,

    /// How long to run. `None` (or zero) runs until stopped externally.
    #[cfg_attr(
        feature = "serde",
        serde_as(as = "Option<DurationSecondsWithFrac<f64>>")
    )]
    pub duration: Option<Duration>,

    /// Workload-specific parameter (a URL, a delay, ...). Opaque to the engine.
    pub target: Option<String>,

    pub topology: RateTopology,

    /// Capacity of the outcome channel. Producers wait when it is full.
    pub outcome_buffer: usize,

    /// Cap on the per-worker startup jitter.
    #[cfg_attr(feature = "serde", serde_as(as = "DurationSecondsWithFrac<f64>"))]
    pub max_jitter: Duration,

    /// Seed for the jitter generator. `None` seeds from entropy.
    pub seed: Option<u64>,

    /// How often the aggregator publishes a statistics snapshot. `None` only publishes the
    /// final state.
    #[cfg_attr(
        feature = "serde",
        serde_as(as = "Option<DurationSecondsWithFrac<f64>>")
    )]
    pub progress_interval: Option<Duration>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self {
            concurrency: 1,
            qps: 1,
            duration: None,
            target: None,
            topology: RateTopology::PerWorker,
            outcome_buffer: DEFAULT_OUTCOME_BUFFER,
            max_jitter: DEFAULT_MAX_JITTER,
            seed: None,
            progress_interval: None,
        }
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn qps(mut self, qps: i64) -> Self {
        self.qps = qps;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Run until stopped externally.
    pub fn unbounded(mut self) -> Self {
        self.duration = None;
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn topology(mut self, topology: RateTopology) -> Self {
        self.topology = topology;
        self
    }

    pub fn outcome_buffer(mut self, outcome_buffer: usize) -> Self {
        self.outcome_buffer = outcome_buffer;
        self
    }

    pub fn max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = Some(interval);
        self
    }

    /// Whether workers loop on a rate limit rather than running a single pass.
    pub fn is_throttled(&self) -> bool {
        self.qps > 0
    }

    /// Interval between ticks of a single per-worker timer. `Ok(None)` when unthrottled.
    pub fn tick_interval(&self) -> Result<Option<Duration>, ConfigError> {
        if !self.is_throttled() {
            return Ok(None);
        }

        if self.qps > MAX_PER_WORKER_QPS {
            return Err(ConfigError::RateTooHigh {
                qps: self.qps,
                max: MAX_PER_WORKER_QPS,
            });
        }

        // NOTE: qps is in (0, MAX_PER_WORKER_QPS] here so the interval is at least 1us.
        let micros = MICROS_PER_SECOND / self.qps as u64;
        Ok(Some(Duration::from_micros(micros)))
    }

    /// Expected aggregate invocations per second across the whole pool, if throttled.
    pub fn target_rate(&self) -> Option<f64> {
        if !self.is_throttled() {
            return None;
        }

        match self.topology {
            RateTopology::PerWorker => Some(self.concurrency.max(1) as f64 * self.qps as f64),
            RateTopology::Shared => Some(self.qps as f64),
        }
    }

    /// Checks the configuration and returns the normalized copy a run will use.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        self.concurrency = self.concurrency.max(1);
        // A zero duration means unbounded.
        self.duration = self.duration.filter(|d| !d.is_zero());

        if self.outcome_buffer == 0 {
            return Err(ConfigError::ZeroOutcomeBuffer);
        }

        match self.topology {
            RateTopology::PerWorker => {
                self.tick_interval()?;
            }
            RateTopology::Shared => {
                if self.qps > i64::from(u32::MAX) {
                    return Err(ConfigError::RateTooHigh {
                        qps: self.qps,
                        max: i64::from(u32::MAX),
                    });
                }
            }
        }

        Ok(self)
    }
}
