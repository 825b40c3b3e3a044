use thiserror::Error;

/// Invalid run configuration. Always reported before any worker starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("QPS of {qps} is too high: the tick interval would round down to zero (max {max})")]
    RateTooHigh { qps: i64, max: i64 },

    #[error("Outcome buffer must hold at least one outcome")]
    ZeroOutcomeBuffer,
}
