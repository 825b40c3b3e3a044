#![cfg_attr(docsrs, feature(doc_cfg))]
//! Rate-limited load generation for pluggable workloads.
//!
//! An [`Engine`] drives a [`Workload`] with `concurrency` workers, each ticking at `qps`
//! invocations per second (so the pool as a whole targets `concurrency * qps`), until the
//! configured duration elapses or a [`StopHandle`] is raised. Every measured invocation is
//! funneled through a bounded channel into a single aggregator, and the run ends with a
//! [`RunReport`].
//!
//! # Example
//! ```no_run
//! use wideload::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! struct Ping;
//!
//! #[async_trait]
//! impl Workload for Ping {
//!     fn name(&self) -> &str {
//!         "ping"
//!     }
//!
//!     async fn test(&self, _worker: WorkerId) -> Result<(), BoxError> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), EngineError> {
//!     let config = RunConfig::new()
//!         .concurrency(3)
//!         .qps(5)
//!         .duration(Duration::from_secs(2));
//!
//!     let engine = Engine::new(config)?;
//!     let report = engine.run(Arc::new(Ping)).await?;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```
mod aggregator;
mod digest;
mod engine;
mod error;
mod limiter;
mod pool;
mod registry;
mod stop;
mod worker;
mod workload;

#[cfg(test)]
mod testing;

pub use engine::Engine;
pub use error::{EngineError, RegistryError};
pub use registry::{WorkloadFactory, WorkloadRegistry};
pub use stop::StopHandle;
pub use worker::WorkerState;
pub use workload::{BoxError, Suite, WorkerId, Workload};

pub use wideload_core as core;
pub use wideload_core::{
    ConfigError, LatencySummary, Outcome, RateTopology, RunConfig, RunReport, RunStatistics,
    StopReason,
};

pub mod prelude {
    pub use crate::{
        BoxError, Engine, EngineError, StopHandle, Suite, WorkerId, Workload, WorkloadRegistry,
    };
    pub use async_trait::async_trait;
    pub use wideload_core::{RateTopology, RunConfig, RunReport, RunStatistics, StopReason};
}
