use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use wideload::prelude::*;

pub const DEFAULT_DELAY: Duration = Duration::from_millis(10);

/// Simulated latency: every invocation sleeps for a fixed delay.
#[derive(Debug, Clone)]
pub struct SleepWorkload {
    delay: Duration,
}

impl SleepWorkload {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// The target, if any, is the delay as a humantime span (e.g. `25ms`).
pub fn suite(config: &RunConfig) -> Result<Suite, BoxError> {
    let delay = match config.target.as_deref() {
        Some(target) => humantime::parse_duration(target)
            .with_context(|| format!("invalid sleep delay {target:?}"))?,
        None => DEFAULT_DELAY,
    };
    Ok(Suite::new("sleep").with(Arc::new(SleepWorkload::new(delay))))
}

#[async_trait]
impl Workload for SleepWorkload {
    fn name(&self) -> &str {
        "sleep"
    }

    async fn test(&self, _worker: WorkerId) -> Result<(), BoxError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}
