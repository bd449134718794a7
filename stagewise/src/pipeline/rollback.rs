//! Compensation of already-started stages.

use crate::core::PipelineMetadata;
use crate::errors::StageRollbackError;
use crate::stages::StageConfiguration;
use tracing::{debug, error};

/// Stages that began executing during one invocation, in execution order.
///
/// A stage is pushed before it executes, so a stage that fails (or is
/// short-circuited by middleware) is still rolled back.
pub struct ProcessedStages<'p, A, C> {
    stack: Vec<&'p StageConfiguration<A, C>>,
}

impl<'p, A, C> ProcessedStages<'p, A, C> {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    /// Records that a stage is about to execute.
    pub fn push(&mut self, stage: &'p StageConfiguration<A, C>) {
        self.stack.push(stage);
    }

    /// Returns the number of recorded stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Returns true if no stage has started.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Returns the recorded stage names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.stack.iter().map(|stage| stage.name()).collect()
    }

    /// Runs the rollback hooks of the recorded stages, most recent first.
    ///
    /// Stages without a hook are passed over. The first failing hook stops
    /// the unwind: hooks of stages that started earlier are not invoked.
    ///
    /// Returns the names of the stages rolled back.
    ///
    /// # Errors
    ///
    /// Returns a [`StageRollbackError`] naming the failed stage, the stages
    /// already rolled back and the stages skipped.
    pub async fn rollback(
        mut self,
        context: &mut C,
        metadata: &PipelineMetadata<A>,
    ) -> Result<Vec<String>, StageRollbackError> {
        let mut rolled_back = Vec::new();

        while let Some(stage) = self.stack.pop() {
            let Some(hook) = stage.rollback() else {
                continue;
            };
            let name = stage.name();
            debug!(stage = %name, "rolling back stage");

            if let Err(cause) = hook.rollback(context, metadata).await {
                error!(stage = %name, error = %format!("{cause:#}"), "rollback hook failed");
                let skipped = self
                    .stack
                    .iter()
                    .rev()
                    .filter(|stage| stage.has_rollback())
                    .map(|stage| stage.name())
                    .collect();
                return Err(StageRollbackError {
                    stage: name,
                    rolled_back,
                    skipped,
                    cause,
                });
            }

            rolled_back.push(name);
        }

        Ok(rolled_back)
    }
}

impl<A, C> Default for ProcessedStages<'_, A, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, C> std::fmt::Debug for ProcessedStages<'_, A, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessedStages")
            .field("stages", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageResult;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default)]
    struct Journal {
        undone: Vec<&'static str>,
    }

    fn noop(_ctx: &mut Journal, _meta: &PipelineMetadata<()>) -> StageResult {
        Ok(None)
    }

    fn undoable(name: &'static str) -> StageConfiguration<(), Journal> {
        StageConfiguration::from_fn(noop)
            .with_name(name)
            .with_rollback_fn(move |ctx: &mut Journal, _meta: &PipelineMetadata<()>| {
                ctx.undone.push(name);
                Ok(())
            })
    }

    fn broken(name: &'static str) -> StageConfiguration<(), Journal> {
        StageConfiguration::from_fn(noop)
            .with_name(name)
            .with_rollback_fn(move |ctx: &mut Journal, _meta: &PipelineMetadata<()>| {
                ctx.undone.push(name);
                anyhow::bail!("cannot undo {name}")
            })
    }

    #[tokio::test]
    async fn test_rollback_is_lifo_and_skips_bare_stages() {
        let first = undoable("first");
        let plain = StageConfiguration::from_fn(noop).with_name("plain");
        let second = undoable("second");
        let mut stack = ProcessedStages::new();
        stack.push(&first);
        stack.push(&plain);
        stack.push(&second);
        let metadata = PipelineMetadata::new("rollback", ());
        let mut journal = Journal::default();

        assert_eq!(stack.names(), vec!["first", "plain", "second"]);
        let rolled_back = stack.rollback(&mut journal, &metadata).await.unwrap();

        assert_eq!(journal.undone, vec!["second", "first"]);
        assert_eq!(rolled_back, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_rollback_fails_fast() {
        let first = undoable("first");
        let second = broken("second");
        let third = undoable("third");
        let mut stack = ProcessedStages::new();
        stack.push(&first);
        stack.push(&second);
        stack.push(&third);
        let metadata = PipelineMetadata::new("rollback", ());
        let mut journal = Journal::default();

        let err = stack.rollback(&mut journal, &metadata).await.unwrap_err();

        assert_eq!(journal.undone, vec!["third", "second"]);
        assert_eq!(err.stage, "second");
        assert_eq!(err.rolled_back, vec!["third"]);
        assert_eq!(err.skipped, vec!["first"]);
        assert_eq!(err.cause.to_string(), "cannot undo second");
        assert_eq!(err.to_string(), "Rollback failed for stage: second");
    }

    #[tokio::test]
    async fn test_empty_stack_is_a_noop() {
        let stack: ProcessedStages<'_, (), Journal> = ProcessedStages::default();
        let metadata = PipelineMetadata::new("rollback", ());
        let mut journal = Journal::default();

        assert!(stack.is_empty());
        let rolled_back = stack.rollback(&mut journal, &metadata).await.unwrap();
        assert!(rolled_back.is_empty());
    }
}
