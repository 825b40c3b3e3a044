//! Built-in workloads, selectable by name.
use wideload::WorkloadRegistry;

pub mod http;
pub mod sleep;

pub fn registry() -> WorkloadRegistry {
    WorkloadRegistry::new()
        .register("http", http::suite)
        .register("sleep", sleep::suite)
        .register("test", test::suite)
}
