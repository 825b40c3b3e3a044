use crate::workload::{BoxError, WorkerId, Workload};
use async_trait::async_trait;
use rand_distr::{Distribution, SkewNormal};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Configurable in-memory workload that counts every call made on it.
#[derive(Default)]
pub(crate) struct MockWorkload {
    name: Option<&'static str>,
    latency: Duration,
    noise: Option<Duration>,
    setup_latency: Duration,
    fail_every: Option<usize>,
    fail_setup_on: Option<usize>,
    fail_iteration_setup: bool,
    fail_teardown: bool,
    panic_on: Option<usize>,

    setup_once: AtomicUsize,
    setup: AtomicUsize,
    test: AtomicUsize,
    teardown: AtomicUsize,
    test_starts: Mutex<Vec<Instant>>,
    teardown_workers: Mutex<HashSet<usize>>,
}

impl MockWorkload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Skewed random latency around `latency` with the given spread.
    pub fn noise(mut self, std: Duration) -> Self {
        self.noise = Some(std);
        self
    }

    pub fn setup_latency(mut self, latency: Duration) -> Self {
        self.setup_latency = latency;
        self
    }

    /// Every `n`-th test call fails.
    pub fn fail_every(mut self, n: usize) -> Self {
        self.fail_every = Some(n);
        self
    }

    pub fn fail_setup_on(mut self, worker: usize) -> Self {
        self.fail_setup_on = Some(worker);
        self
    }

    pub fn fail_iteration_setup(mut self) -> Self {
        self.fail_iteration_setup = true;
        self
    }

    pub fn fail_teardown(mut self) -> Self {
        self.fail_teardown = true;
        self
    }

    /// `test` panics on the given worker.
    pub fn panic_on(mut self, worker: usize) -> Self {
        self.panic_on = Some(worker);
        self
    }

    pub fn setup_once_calls(&self) -> usize {
        self.setup_once.load(Ordering::SeqCst)
    }

    pub fn setup_calls(&self) -> usize {
        self.setup.load(Ordering::SeqCst)
    }

    pub fn test_calls(&self) -> usize {
        self.test.load(Ordering::SeqCst)
    }

    pub fn teardown_calls(&self) -> usize {
        self.teardown.load(Ordering::SeqCst)
    }

    pub fn test_starts(&self) -> Vec<Instant> {
        self.test_starts.lock().unwrap().clone()
    }

    pub fn teardown_workers(&self) -> HashSet<usize> {
        self.teardown_workers.lock().unwrap().clone()
    }

    fn sample_latency(&self) -> Duration {
        match self.noise {
            Some(std) => {
                let normal =
                    SkewNormal::new(self.latency.as_secs_f64(), std.as_secs_f64(), 20.).unwrap();
                let v: f64 = normal.sample(&mut rand::thread_rng()).max(0.);
                Duration::from_secs_f64(v)
            }
            None => self.latency,
        }
    }
}

#[async_trait]
impl Workload for MockWorkload {
    fn name(&self) -> &str {
        self.name.unwrap_or("mock")
    }

    async fn setup_once(&self, worker: WorkerId) -> Result<(), BoxError> {
        self.setup_once.fetch_add(1, Ordering::SeqCst);
        if self.fail_setup_on == Some(worker.0) {
            return Err(format!("no credentials for {worker}").into());
        }
        Ok(())
    }

    async fn setup(&self, _worker: WorkerId) -> Result<(), BoxError> {
        self.setup.fetch_add(1, Ordering::SeqCst);
        if !self.setup_latency.is_zero() {
            tokio::time::sleep(self.setup_latency).await;
        }
        if self.fail_iteration_setup {
            return Err("iteration setup failed".into());
        }
        Ok(())
    }

    async fn test(&self, worker: WorkerId) -> Result<(), BoxError> {
        if self.panic_on == Some(worker.0) {
            panic!("{worker} panicked");
        }
        self.test_starts.lock().unwrap().push(Instant::now());
        let call = self.test.fetch_add(1, Ordering::SeqCst) + 1;

        let latency = self.sample_latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        match self.fail_every {
            Some(n) if call % n == 0 => Err(format!("call {call} failed").into()),
            _ => Ok(()),
        }
    }

    async fn teardown(&self, worker: WorkerId) -> Result<(), BoxError> {
        self.teardown.fetch_add(1, Ordering::SeqCst);
        self.teardown_workers.lock().unwrap().insert(worker.0);
        if self.fail_teardown {
            return Err("teardown failed".into());
        }
        Ok(())
    }
}
