use crate::{BoxError, WorkerId};
use thiserror::Error;
use tokio::task::JoinError;
use wideload_core::ConfigError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Workload \"{workload}\" failed setup on {worker}: {source}")]
    Setup {
        workload: String,
        worker: WorkerId,
        #[source]
        source: BoxError,
    },

    #[error("Unable to create latency histogram: {0}")]
    Histogram(#[from] hdrhistogram::CreationError),

    #[error("Worker task panicked: {0}")]
    WorkerPanicked(#[source] JoinError),

    #[error("Aggregator task panicked: {0}")]
    AggregatorPanicked(#[source] JoinError),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("No workload named \"{name}\" is registered (available: {available})")]
    Unknown { name: String, available: String },

    #[error("Failed to build workload \"{name}\": {source}")]
    Build {
        name: String,
        #[source]
        source: BoxError,
    },
}
