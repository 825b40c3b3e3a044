use clap::Parser;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use wideload::{RateTopology, RunConfig};

/// Drive a built-in workload at a fixed rate.
///
/// ```text
/// $ wideload --concurrency 4 --qps 10 --duration 30s --target http://localhost:3000/ http
/// $ wideload --duration -1 test
/// ```
#[derive(Parser, Debug)]
#[command(name = "wideload", version, about)]
pub struct WideloadCli {
    /// Number of concurrent workers. Never less than 1.
    #[arg(short, long, default_value_t = 1)]
    pub concurrency: usize,

    /// Invocations per second, per worker. `0` or less runs each worker once.
    #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
    pub qps: i64,

    /// How long to run (e.g. `10s`, `3m`). `0` or `-1` runs until interrupted.
    #[arg(short, long, default_value = "10s", allow_negative_numbers = true)]
    pub duration: RunLength,

    /// Workload target, e.g. the URL for `http` or the delay for `sleep`.
    #[arg(short, long)]
    pub target: Option<String>,

    /// Share a single `qps` budget across all workers.
    #[arg(long)]
    pub shared_rate: bool,

    /// Seed for the startup jitter.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print reports as JSON lines instead of text.
    #[arg(long)]
    pub json: bool,

    /// Name of the workload to run.
    pub workload: String,
}

impl WideloadCli {
    pub fn config(&self) -> RunConfig {
        let mut config = RunConfig::new()
            .concurrency(self.concurrency)
            .qps(self.qps)
            .topology(if self.shared_rate {
                RateTopology::Shared
            } else {
                RateTopology::PerWorker
            });

        config = match self.duration.0 {
            Some(duration) => config.duration(duration),
            None => config.unbounded(),
        };
        if let Some(target) = &self.target {
            config = config.target(target.clone());
        }
        if let Some(seed) = self.seed {
            config = config.seed(seed);
        }
        config
    }
}

/// A run duration where `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLength(pub Option<Duration>);

impl FromStr for RunLength {
    type Err = humantime::DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // Bare integers are seconds.
        if let Ok(n) = s.parse::<i64>() {
            return Ok(Self((n > 0).then(|| Duration::from_secs(n as u64))));
        }

        let duration = humantime::parse_duration(s)?;
        Ok(Self((!duration.is_zero()).then_some(duration)))
    }
}

impl fmt::Display for RunLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(duration) => write!(f, "{}", humantime::format_duration(duration)),
            None => write!(f, "unbounded"),
        }
    }
}
