use crate::limiter::RunPacing;
use crate::stop::StopHandle;
use crate::workload::{BoxError, WorkerId, Workload};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};
use wideload_core::{Outcome, StopReason};

/// Lifecycle of a single worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Stopping,
    Terminated,
}

pub(crate) struct Worker {
    id: WorkerId,
    workload: Arc<dyn Workload>,
    name: String,
    pacing: RunPacing,
    jitter: Duration,
    tx: mpsc::Sender<Outcome>,
    stop: StopHandle,
    state: WorkerState,
}

pub(crate) struct WorkerSummary {
    pub id: WorkerId,
    pub iterations: u64,
    pub setup_error: Option<BoxError>,
}

impl Worker {
    pub fn new(
        id: WorkerId,
        workload: Arc<dyn Workload>,
        pacing: RunPacing,
        jitter: Duration,
        tx: mpsc::Sender<Outcome>,
        stop: StopHandle,
    ) -> Self {
        let name = workload.name().to_string();
        Self {
            id,
            workload,
            name,
            pacing,
            jitter,
            tx,
            stop,
            state: WorkerState::Idle,
        }
    }

    /// Runs the worker to completion. Teardown is always called exactly once, and the outcome
    /// sender is dropped only after it.
    pub async fn run(mut self) -> WorkerSummary {
        self.transition(WorkerState::Running);

        let mut iterations = 0;
        let setup_error = match self.workload.setup_once(self.id).await {
            Ok(()) => {
                iterations = self.iterate_until_stopped().await;
                None
            }
            Err(err) => {
                error!("{} setup failed: {err}", self.id);
                self.stop.stop(StopReason::SetupFailed);
                Some(err)
            }
        };

        self.transition(WorkerState::Stopping);
        if let Err(err) = self.workload.teardown(self.id).await {
            warn!("{} teardown failed: {err}", self.id);
        }
        self.transition(WorkerState::Terminated);

        WorkerSummary {
            id: self.id,
            iterations,
            setup_error,
        }
    }

    async fn iterate_until_stopped(&self) -> u64 {
        if !self.wait_jitter().await {
            return 0;
        }

        let mut ticker = self.pacing.ticker();
        trace!("{} ticking {ticker}.", self.id);
        let mut iterations = 0;
        loop {
            let ready = tokio::select! {
                biased;
                _ = self.stop.stopped() => false,
                ready = ticker.tick() => ready,
            };

            // NOTE: A tick can race with a stop; never start a new iteration once stopped.
            if !ready || self.stop.is_stopped() {
                break;
            }

            let outcome = self.iterate().await;
            if self.tx.send(outcome).await.is_err() {
                error!("{} outcome sink closed early.", self.id);
                break;
            }
            iterations += 1;
        }

        iterations
    }

    /// Sleeps the startup jitter. Returns `false` if stopped in the meantime.
    ///
    /// An unthrottled worker makes its single pass straight away.
    async fn wait_jitter(&self) -> bool {
        if self.jitter.is_zero() || self.pacing.is_once() {
            return !self.stop.is_stopped();
        }

        trace!("{} waiting {:?} before starting.", self.id, self.jitter);
        tokio::select! {
            biased;
            _ = self.stop.stopped() => false,
            _ = tokio::time::sleep(self.jitter) => true,
        }
    }

    async fn iterate(&self) -> Outcome {
        if let Err(err) = self.workload.setup(self.id).await {
            warn!("{} iteration setup failed: {err}", self.id);
            let outcome = Outcome::failure(self.id.0, Duration::ZERO);
            self.record_metrics(&outcome);
            return outcome;
        }

        let start = Instant::now();
        let res = self.workload.test(self.id).await;
        let latency = start.elapsed();

        let outcome = match res {
            Ok(()) => Outcome::success(self.id.0, latency),
            Err(err) => {
                debug!("{} invocation failed: {err}", self.id);
                Outcome::failure(self.id.0, latency)
            }
        };
        self.record_metrics(&outcome);
        outcome
    }

    #[cfg(feature = "metrics")]
    fn record_metrics(&self, outcome: &Outcome) {
        metrics::histogram!("wideload_latency", "workload" => self.name.clone())
            .record(outcome.latency.as_nanos() as f64);
        if outcome.failed {
            metrics::counter!("wideload_error", "workload" => self.name.clone()).increment(1);
        } else {
            metrics::counter!("wideload_success", "workload" => self.name.clone()).increment(1);
        }
    }

    #[cfg(not(feature = "metrics"))]
    fn record_metrics(&self, _outcome: &Outcome) {}

    fn transition(&mut self, state: WorkerState) {
        debug!(workload = %self.name, "{}: {:?} -> {:?}", self.id, self.state, state);
        self.state = state;
    }
}
