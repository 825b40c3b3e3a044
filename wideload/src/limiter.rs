use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use wideload_core::{ConfigError, RateTopology, RunConfig};

/// How a worker paces its iterations. Computed once, before any worker starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pacing {
    /// A single unthrottled iteration.
    Once,
    /// An independent timer per worker.
    Interval(Duration),
    /// One limiter shared by the whole pool.
    Shared(NonZeroU32),
}

impl Pacing {
    pub fn new(config: &RunConfig) -> Result<Self, ConfigError> {
        if !config.is_throttled() {
            return Ok(Pacing::Once);
        }

        match config.topology {
            RateTopology::PerWorker => match config.tick_interval()? {
                Some(interval) => Ok(Pacing::Interval(interval)),
                None => Ok(Pacing::Once),
            },
            RateTopology::Shared => {
                let qps = u32::try_from(config.qps)
                    .ok()
                    .and_then(NonZeroU32::new)
                    .ok_or(ConfigError::RateTooHigh {
                        qps: config.qps,
                        max: i64::from(u32::MAX),
                    })?;
                Ok(Pacing::Shared(qps))
            }
        }
    }

    /// Per-run state: the shared limiter is created fresh so no permits carry over.
    pub fn start(&self) -> RunPacing {
        match *self {
            Pacing::Once => RunPacing::Once,
            Pacing::Interval(dur) => RunPacing::Interval(dur),
            Pacing::Shared(qps) => RunPacing::Shared(Arc::new(rate_limiter(qps))),
        }
    }
}

/// Pacing instantiated for one run. Cloned into every worker.
#[derive(Clone)]
pub(crate) enum RunPacing {
    Once,
    Interval(Duration),
    Shared(Arc<DefaultDirectRateLimiter>),
}

impl RunPacing {
    pub fn is_once(&self) -> bool {
        matches!(self, RunPacing::Once)
    }

    /// Called by a worker right before its loop, after startup jitter.
    pub fn ticker(&self) -> Ticker {
        match self {
            RunPacing::Once => Ticker::Once { fired: false },
            RunPacing::Interval(dur) => Ticker::Interval(Timer::new(*dur)),
            RunPacing::Shared(limiter) => Ticker::Shared(limiter.clone()),
        }
    }
}

pub(crate) enum Ticker {
    Once { fired: bool },
    Interval(Timer),
    Shared(Arc<DefaultDirectRateLimiter>),
}

impl Ticker {
    /// Waits for the next iteration slot. Returns `false` once no more iterations are allowed.
    pub async fn tick(&mut self) -> bool {
        match self {
            Ticker::Once { fired } => !std::mem::replace(fired, true),
            Ticker::Interval(timer) => {
                timer.tick().await;
                true
            }
            Ticker::Shared(limiter) => {
                limiter.until_ready().await;
                true
            }
        }
    }
}

pub(crate) struct Timer {
    interval: Interval,
    interval_dur: Duration,
}

impl Timer {
    pub fn new(interval_dur: Duration) -> Self {
        // NOTE: The first tick is one full interval out, not immediate.
        let mut interval = interval_at(Instant::now() + interval_dur, interval_dur);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            interval_dur,
        }
    }

    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Ticker::Once { .. } => write!(f, "once"),
            Ticker::Interval(timer) => write!(f, "every {timer}"),
            Ticker::Shared(_) => write!(f, "from the shared limiter"),
        }
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", humantime::format_duration(self.interval_dur))
    }
}

fn rate_limiter(qps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(qps).allow_burst(NonZeroU32::MIN))
}
