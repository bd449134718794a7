//! Per-invocation pipeline metadata.

use uuid::Uuid;

/// Immutable identity of a single pipeline invocation.
///
/// Created once when the pipeline is invoked and shared by reference with
/// every stage, middleware layer and rollback hook of that invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineMetadata<A> {
    name: String,
    arguments: A,
    run_id: Uuid,
}

impl<A> PipelineMetadata<A> {
    /// Creates metadata for a new invocation with a fresh run ID.
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: A) -> Self {
        Self {
            name: name.into(),
            arguments,
            run_id: Uuid::new_v4(),
        }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the arguments the pipeline was invoked with.
    #[must_use]
    pub fn arguments(&self) -> &A {
        &self.arguments
    }

    /// Returns the run ID used to correlate log records of this invocation.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_accessors() {
        let metadata = PipelineMetadata::new("orders", 42_u32);

        assert_eq!(metadata.name(), "orders");
        assert_eq!(*metadata.arguments(), 42);
        assert_eq!(metadata.run_id().get_version_num(), 4);
    }

    #[test]
    fn test_each_invocation_gets_its_own_run_id() {
        let first = PipelineMetadata::new("orders", ());
        let second = PipelineMetadata::new("orders", ());

        assert_ne!(first.run_id(), second.run_id());
    }
}
