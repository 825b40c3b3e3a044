use crate::error::RegistryError;
use crate::workload::{BoxError, Suite};
use std::collections::BTreeMap;
use wideload_core::RunConfig;

/// Builds a [`Suite`] for a run. Receives the validated configuration so workloads can pick
/// up their `target`.
pub type WorkloadFactory = fn(&RunConfig) -> Result<Suite, BoxError>;

/// Named workload factories, selectable at run time (e.g. from a command line).
#[derive(Default, Clone)]
pub struct WorkloadRegistry {
    factories: BTreeMap<&'static str, WorkloadFactory>,
}

impl WorkloadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`, replacing any previous entry.
    pub fn register(mut self, name: &'static str, factory: WorkloadFactory) -> Self {
        self.factories.insert(name, factory);
        self
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn build(&self, name: &str, config: &RunConfig) -> Result<Suite, RegistryError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RegistryError::Unknown {
                name: name.to_string(),
                available: self.names().collect::<Vec<_>>().join(", "),
            })?;

        factory(config).map_err(|source| RegistryError::Build {
            name: name.to_string(),
            source,
        })
    }
}

impl std::fmt::Debug for WorkloadRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
