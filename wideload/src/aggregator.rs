use crate::digest::LatencyDigest;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
#[allow(unused)]
use tracing::{debug, trace};
use wideload_core::{LatencySummary, Outcome, RunStatistics};

/// Single consumer of every outcome produced during a run.
///
/// Runs until all senders are dropped, then returns the final statistics. Since the caller
/// only gets those by awaiting the aggregator, the read always happens after the last
/// producer has gone away.
pub(crate) struct Aggregator {
    rx: mpsc::Receiver<Outcome>,
    stats: RunStatistics,
    latency: LatencyDigest,
    progress: Arc<watch::Sender<RunStatistics>>,
    progress_interval: Option<Duration>,
}

impl Aggregator {
    pub fn new(
        rx: mpsc::Receiver<Outcome>,
        latency: LatencyDigest,
        progress: Arc<watch::Sender<RunStatistics>>,
        progress_interval: Option<Duration>,
    ) -> Self {
        Self {
            rx,
            stats: RunStatistics::new(),
            latency,
            progress,
            progress_interval,
        }
    }

    pub async fn run(mut self) -> (RunStatistics, LatencySummary) {
        let mut ticker = self.progress_interval.map(|dur| {
            let mut interval = interval_at(Instant::now() + dur, dur);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });

        loop {
            let outcome = match ticker.as_mut() {
                Some(ticker) => tokio::select! {
                    outcome = self.rx.recv() => outcome,
                    _ = ticker.tick() => {
                        self.publish();
                        continue;
                    }
                },
                None => self.rx.recv().await,
            };

            match outcome {
                Some(outcome) => self.record(outcome),
                None => break,
            }
        }

        debug!(
            "Outcome sink closed after {} outcomes ({} latencies).",
            self.stats.total_invocations,
            self.latency.len()
        );
        self.publish();
        (self.stats, self.latency.summary())
    }

    fn record(&mut self, outcome: Outcome) {
        trace!(?outcome, "Outcome");
        self.stats.record(&outcome);
        self.latency.insert(outcome.latency);
    }

    fn publish(&self) {
        self.progress.send_replace(self.stats.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregator(capacity: usize) -> (mpsc::Sender<Outcome>, Aggregator, watch::Receiver<RunStatistics>) {
        let (tx, rx) = mpsc::channel(capacity);
        let (progress, progress_rx) = watch::channel(RunStatistics::new());
        let latency = LatencyDigest::new().unwrap();
        (
            tx,
            Aggregator::new(rx, latency, Arc::new(progress), None),
            progress_rx,
        )
    }

    #[tokio::test]
    async fn drains_until_closed() {
        let (tx, aggregator, progress) = aggregator(4);
        let handle = tokio::spawn(aggregator.run());

        let mut producers = tokio::task::JoinSet::new();
        for worker in 0..5 {
            let tx = tx.clone();
            producers.spawn(async move {
                for i in 0..20u64 {
                    let latency = Duration::from_millis(10 + worker as u64);
                    let outcome = if i % 4 == 0 {
                        Outcome::failure(worker, latency)
                    } else {
                        Outcome::success(worker, latency)
                    };
                    tx.send(outcome).await.unwrap();
                }
            });
        }
        drop(tx);
        while let Some(res) = producers.join_next().await {
            res.unwrap();
        }

        let (stats, latency) = handle.await.unwrap();
        assert_eq!(stats.total_invocations, 100);
        assert_eq!(stats.failure_count, 25);
        assert_eq!(stats.success_count, 75);
        assert_eq!(stats.total_latency_ms, 20 * (10 + 11 + 12 + 13 + 14));
        assert_eq!(stats.average_latency_ms, 12.);
        assert_eq!(stats.fastest, Some(Duration::from_millis(10)));
        assert_eq!(stats.slowest, Some(Duration::from_millis(14)));
        assert!(latency.p50 >= Duration::from_millis(10) && latency.p50 <= Duration::from_millis(15));
        assert!(latency.p99 >= Duration::from_millis(14) && latency.p99 <= Duration::from_millis(15));

        assert_eq!(*progress.borrow(), stats);
    }

    #[tokio::test]
    async fn empty_run() {
        let (tx, aggregator, _progress) = aggregator(1);
        drop(tx);
        let (stats, latency) = aggregator.run().await;
        assert_eq!(stats, RunStatistics::new());
        assert_eq!(stats.average_latency_ms, 0.);
        assert_eq!(latency, LatencySummary::default());
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_progress_periodically() {
        let (tx, rx) = mpsc::channel(8);
        let (progress, mut progress_rx) = watch::channel(RunStatistics::new());
        let aggregator = Aggregator::new(
            rx,
            LatencyDigest::new().unwrap(),
            Arc::new(progress),
            Some(Duration::from_millis(100)),
        );
        let handle = tokio::spawn(aggregator.run());

        tx.send(Outcome::success(0, Duration::from_millis(1)))
            .await
            .unwrap();
        tx.send(Outcome::success(0, Duration::from_millis(1)))
            .await
            .unwrap();

        progress_rx.changed().await.unwrap();
        assert_eq!(progress_rx.borrow_and_update().total_invocations, 2);

        drop(tx);
        let (stats, _) = handle.await.unwrap();
        assert_eq!(stats.total_invocations, 2);
    }
}
