use crate::limiter::RunPacing;
use crate::stop::StopHandle;
use crate::worker::{Worker, WorkerSummary};
use crate::workload::{WorkerId, Workload};
use rand::{rngs::SmallRng, Rng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn, Instrument};
use wideload_core::{Outcome, StopReason, JITTER_SLOTS, JITTER_STEP};

/// A fixed set of `concurrency` workers sharing one workload, outcome sink and stop signal.
///
/// The pool does no rate limiting of its own. With per-worker pacing each worker ticks
/// independently, so the pool as a whole targets `concurrency * qps`.
pub(crate) struct WorkerPool {
    workers: Vec<Worker>,
    stop: StopHandle,
}

pub(crate) struct PoolSummary {
    pub workers: Vec<WorkerSummary>,
    pub panics: Vec<JoinError>,
}

impl WorkerPool {
    /// `tx` is cloned into each worker and then dropped, so the sink closes exactly when the
    /// last worker exits.
    pub fn new(
        concurrency: usize,
        pacing: RunPacing,
        max_jitter: Duration,
        workload: Arc<dyn Workload>,
        tx: mpsc::Sender<Outcome>,
        stop: &StopHandle,
        rng: &mut SmallRng,
    ) -> Self {
        let workers = (0..concurrency.max(1))
            .map(|index| {
                Worker::new(
                    WorkerId(index),
                    workload.clone(),
                    pacing.clone(),
                    startup_jitter(rng, index, max_jitter),
                    tx.clone(),
                    stop.clone(),
                )
            })
            .collect();

        Self {
            workers,
            stop: stop.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Runs every worker to termination. The first panicking worker stops the others.
    pub async fn run(self) -> PoolSummary {
        let mut tasks = JoinSet::new();
        for worker in self.workers {
            tasks.spawn(worker.run().in_current_span());
        }

        let mut workers = Vec::with_capacity(tasks.len());
        let mut panics = vec![];
        while let Some(res) = tasks.join_next().await {
            match res {
                Ok(summary) => {
                    trace!("{} finished after {} iterations.", summary.id, summary.iterations);
                    workers.push(summary);
                }
                Err(err) => {
                    error!("Worker task failed: {err}");
                    self.stop.stop(StopReason::WorkerPanicked);
                    panics.push(err);
                }
            }
        }
        workers.sort_by_key(|s| s.id);

        PoolSummary { workers, panics }
    }
}

/// Upper bound of the startup jitter for the worker at `index`.
///
/// Grows by [`JITTER_STEP`] per index and wraps every [`JITTER_SLOTS`] workers, so large pools
/// spread their first requests without anyone waiting longer than `max`.
pub(crate) fn jitter_bound(index: usize, max: Duration) -> Duration {
    let slot = (index % JITTER_SLOTS) as u32 + 1;
    (JITTER_STEP * slot).min(max)
}

pub(crate) fn startup_jitter(rng: &mut SmallRng, index: usize, max: Duration) -> Duration {
    let bound = jitter_bound(index, max).as_nanos() as u64;
    if bound == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(rng.gen_range(0..bound))
}
