use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Error type returned by workload implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Index of a worker within its pool, `0..concurrency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// The unit of work under test.
///
/// A single instance is shared by every worker of a run, so any internal state must be
/// synchronized by the implementation. The engine applies no per-call timeout: a `test` that
/// never returns blocks its worker forever, so implementations talking to the network should
/// set their own I/O timeouts.
#[async_trait]
pub trait Workload: Send + Sync {
    /// Name used in logs, metrics and reports.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called once per worker before its first iteration. An error aborts the whole run.
    async fn setup_once(&self, _worker: WorkerId) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called before every measured invocation. Not included in the latency.
    ///
    /// An error skips the invocation and records it as failed.
    async fn setup(&self, _worker: WorkerId) -> Result<(), BoxError> {
        Ok(())
    }

    /// The measured invocation. An error is recorded as a failed outcome; the worker keeps
    /// going.
    async fn test(&self, worker: WorkerId) -> Result<(), BoxError>;

    /// Called once per worker on exit. Errors are logged and otherwise ignored.
    async fn teardown(&self, _worker: WorkerId) -> Result<(), BoxError> {
        Ok(())
    }
}

/// An ordered set of workloads run one after another with the same configuration.
#[derive(Clone)]
pub struct Suite {
    name: String,
    workloads: Vec<Arc<dyn Workload>>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            workloads: vec![],
        }
    }

    pub fn single(workload: Arc<dyn Workload>) -> Self {
        Self {
            name: workload.name().to_string(),
            workloads: vec![workload],
        }
    }

    pub fn with(mut self, workload: Arc<dyn Workload>) -> Self {
        self.workloads.push(workload);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn workloads(&self) -> &[Arc<dyn Workload>] {
        &self.workloads
    }

    pub fn len(&self) -> usize {
        self.workloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workloads.is_empty()
    }
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.workloads.iter().map(|w| w.name()).collect();
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("workloads", &names)
            .finish()
    }
}
