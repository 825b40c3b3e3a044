use crate::aggregator::Aggregator;
use crate::digest::LatencyDigest;
use crate::error::EngineError;
use crate::limiter::Pacing;
use crate::pool::WorkerPool;
use crate::stop::{spawn_interrupt_watcher, spawn_watchdog, StopHandle};
use crate::workload::{Suite, Workload};
use rand::{rngs::SmallRng, SeedableRng};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};
use wideload_core::{ConfigError, RunConfig, RunReport, RunStatistics, StopReason};

/// Orchestrates runs: builds the worker pool, the aggregator and the duration watchdog, and
/// produces a [`RunReport`] once every worker has terminated.
///
/// The engine never exits the process. Stopping it (explicitly, on interrupt, or because a
/// worker failed setup) ends the current run; a stopped engine stays stopped, so any later
/// run finishes immediately.
pub struct Engine {
    config: RunConfig,
    pacing: Pacing,
    stop: StopHandle,
    progress: Arc<watch::Sender<RunStatistics>>,
}

impl Engine {
    /// Validates `config`. Nothing is started until [`run`](Self::run).
    pub fn new(config: RunConfig) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        let pacing = Pacing::new(&config)?;
        let (progress, _) = watch::channel(RunStatistics::new());

        #[cfg(feature = "metrics")]
        {
            metrics::describe_histogram!(
                "wideload_latency",
                metrics::Unit::Nanoseconds,
                "Latency of measured workload invocations"
            );
            metrics::describe_counter!("wideload_success", "Successful workload invocations");
            metrics::describe_counter!("wideload_error", "Failed workload invocations");
        }

        Ok(Self {
            config,
            pacing,
            stop: StopHandle::new(),
            progress: Arc::new(progress),
        })
    }

    /// The normalized configuration every run uses.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// A handle that stops the current run (and every later one) when raised.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Stop the engine. Idempotent; safe to call after a run has finished.
    pub fn stop(&self) {
        self.stop.stop(StopReason::Requested);
    }

    /// Stop the engine on Ctrl-C. Must be called from within a tokio runtime.
    pub fn stop_on_interrupt(&self) -> JoinHandle<()> {
        spawn_interrupt_watcher(self.stop.clone())
    }

    /// Statistics of the current (or last) run, refreshed every `progress_interval` and once
    /// more when the run finishes.
    pub fn progress(&self) -> watch::Receiver<RunStatistics> {
        self.progress.subscribe()
    }

    /// Drive `workload` until the duration elapses, the engine is stopped, or (unthrottled)
    /// every worker has made its single pass.
    ///
    /// Fails only on setup errors or panics. A panicking worker stops the run; its own teardown
    /// is skipped. Failed invocations are counted in the report.
    #[instrument(name = "run", skip_all, fields(workload = workload.name()))]
    pub async fn run(&self, workload: Arc<dyn Workload>) -> Result<RunReport, EngineError> {
        let name = workload.name().to_string();
        let config = &self.config;
        info!(
            "Starting {name}: concurrency={} qps={} duration={} topology={:?} (target rate {})",
            config.concurrency,
            config.qps,
            config
                .duration
                .map(|d| humantime::format_duration(d).to_string())
                .unwrap_or_else(|| "unbounded".to_string()),
            config.topology,
            config
                .target_rate()
                .map(|r| format!("{r:.2}/s"))
                .unwrap_or_else(|| "single pass".to_string()),
        );

        let start = Instant::now();
        let stop = self.stop.child();

        let latency = LatencyDigest::new()?;
        let (tx, rx) = mpsc::channel(config.outcome_buffer);
        self.progress.send_replace(RunStatistics::new());
        let aggregator = tokio::spawn(
            Aggregator::new(rx, latency, self.progress.clone(), config.progress_interval)
                .run()
                .in_current_span(),
        );

        let watchdog = config
            .duration
            .map(|duration| spawn_watchdog(stop.clone(), duration));

        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let pool = WorkerPool::new(
            config.concurrency,
            self.pacing.start(),
            config.max_jitter,
            workload,
            tx,
            &stop,
            &mut rng,
        );
        debug!("Spawning {} workers.", pool.len());
        let summary = pool.run().await;

        if let Some(watchdog) = watchdog {
            watchdog.abort();
        }

        // NOTE: Every sender lived in a worker, so the aggregator finishes once it drains.
        let (stats, latency) = aggregator.await.map_err(EngineError::AggregatorPanicked)?;
        let elapsed = start.elapsed();

        if let Some(failed) = summary.workers.into_iter().find(|s| s.setup_error.is_some()) {
            let source = failed
                .setup_error
                .unwrap_or_else(|| "unknown setup error".into());
            error!("Run aborted: {} failed setup.", failed.id);
            return Err(EngineError::Setup {
                workload: name,
                worker: failed.id,
                source,
            });
        }

        if let Some(panic) = summary.panics.into_iter().next() {
            return Err(EngineError::WorkerPanicked(panic));
        }

        let report = RunReport {
            workload: name,
            stats,
            latency,
            elapsed,
            stop_reason: stop.reason().unwrap_or(StopReason::Completed),
            config: config.clone(),
        };
        report.log();

        Ok(report)
    }

    /// Run every workload of `suite` in order, one report each. Stops early if the engine is
    /// stopped or a run fails.
    #[instrument(name = "suite", skip_all, fields(suite = suite.name()))]
    pub async fn run_suite(&self, suite: &Suite) -> Result<Vec<RunReport>, EngineError> {
        let mut reports = Vec::with_capacity(suite.len());
        for workload in suite.workloads() {
            if self.stop.is_stopped() {
                warn!(
                    "Engine stopped; skipping {} remaining workloads.",
                    suite.len() - reports.len()
                );
                break;
            }
            reports.push(self.run(workload.clone()).await?);
        }
        Ok(reports)
    }
}
