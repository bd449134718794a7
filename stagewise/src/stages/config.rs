//! Stage declarations: bare stages and stage configurations.

use super::{
    AsyncFnRollback, AsyncFnStage, FnRollback, FnStage, RollbackHandler, StageHandler,
};
use crate::core::{PipelineMetadata, StageResult};
use futures::future::BoxFuture;
use std::fmt::Debug;
use std::sync::Arc;

/// A stage with an optional explicit name and an optional rollback hook.
pub struct StageConfiguration<A, C> {
    name: Option<String>,
    execute: Arc<dyn StageHandler<A, C>>,
    rollback: Option<Arc<dyn RollbackHandler<A, C>>>,
}

impl<A, C> StageConfiguration<A, C> {
    /// Creates a configuration around a shared stage handler.
    #[must_use]
    pub fn from_handler(execute: Arc<dyn StageHandler<A, C>>) -> Self {
        Self {
            name: None,
            execute,
            rollback: None,
        }
    }

    /// Creates a configuration around a stage handler.
    #[must_use]
    pub fn new(execute: impl StageHandler<A, C> + 'static) -> Self {
        Self::from_handler(Arc::new(execute))
    }

    /// Creates a configuration from a synchronous stage function.
    #[must_use]
    pub fn from_fn<F>(func: F) -> Self
    where
        A: Send + Sync + 'static,
        C: Send + 'static,
        F: Fn(&mut C, &PipelineMetadata<A>) -> StageResult + Send + Sync + 'static,
    {
        Self::new(FnStage::new(func))
    }

    /// Creates a configuration from an async stage function.
    #[must_use]
    pub fn from_async_fn<F>(func: F) -> Self
    where
        A: Send + Sync + 'static,
        C: Send + 'static,
        F: for<'a> Fn(&'a mut C, &'a PipelineMetadata<A>) -> BoxFuture<'a, StageResult>
            + Send
            + Sync
            + 'static,
    {
        Self::new(AsyncFnStage::new(func))
    }

    /// Sets the explicit stage name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the rollback hook.
    #[must_use]
    pub fn with_rollback(mut self, rollback: impl RollbackHandler<A, C> + 'static) -> Self {
        self.rollback = Some(Arc::new(rollback));
        self
    }

    /// Sets a synchronous rollback function.
    #[must_use]
    pub fn with_rollback_fn<F>(self, func: F) -> Self
    where
        A: Send + Sync + 'static,
        C: Send + 'static,
        F: Fn(&mut C, &PipelineMetadata<A>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.with_rollback(FnRollback::new(func))
    }

    /// Sets an async rollback function.
    #[must_use]
    pub fn with_async_rollback_fn<F>(self, func: F) -> Self
    where
        A: Send + Sync + 'static,
        C: Send + 'static,
        F: for<'a> Fn(&'a mut C, &'a PipelineMetadata<A>) -> BoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync
            + 'static,
    {
        self.with_rollback(AsyncFnRollback::new(func))
    }

    /// Returns the explicit name, or the execute handler's name.
    #[must_use]
    pub fn name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.execute.name())
    }

    /// Returns true if the stage declares a rollback hook.
    #[must_use]
    pub fn has_rollback(&self) -> bool {
        self.rollback.is_some()
    }

    /// Returns the execute handler.
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn StageHandler<A, C>> {
        &self.execute
    }

    /// Returns the rollback hook, if any.
    #[must_use]
    pub fn rollback(&self) -> Option<&Arc<dyn RollbackHandler<A, C>>> {
        self.rollback.as_ref()
    }
}

impl<A, C> Clone for StageConfiguration<A, C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            execute: Arc::clone(&self.execute),
            rollback: self.rollback.clone(),
        }
    }
}

impl<A, C> Debug for StageConfiguration<A, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageConfiguration")
            .field("name", &self.name())
            .field("has_rollback", &self.has_rollback())
            .finish()
    }
}

/// A stage as declared on a pipeline.
///
/// The variant is fixed when the stage is registered; the executor works
/// on the normalized [`StageConfiguration`] form.
pub enum Stage<A, C> {
    /// A stage that only executes.
    Bare(Arc<dyn StageHandler<A, C>>),
    /// A stage with an optional explicit name and rollback hook.
    Configured(StageConfiguration<A, C>),
}

impl<A, C> Stage<A, C> {
    /// Creates a bare stage from a handler.
    #[must_use]
    pub fn bare(handler: impl StageHandler<A, C> + 'static) -> Self {
        Self::Bare(Arc::new(handler))
    }

    /// Creates a bare stage from a synchronous function.
    #[must_use]
    pub fn from_fn<F>(func: F) -> Self
    where
        A: Send + Sync + 'static,
        C: Send + 'static,
        F: Fn(&mut C, &PipelineMetadata<A>) -> StageResult + Send + Sync + 'static,
    {
        Self::bare(FnStage::new(func))
    }

    /// Creates a bare stage from an async function.
    #[must_use]
    pub fn from_async_fn<F>(func: F) -> Self
    where
        A: Send + Sync + 'static,
        C: Send + 'static,
        F: for<'a> Fn(&'a mut C, &'a PipelineMetadata<A>) -> BoxFuture<'a, StageResult>
            + Send
            + Sync
            + 'static,
    {
        Self::bare(AsyncFnStage::new(func))
    }

    /// Returns true if the stage was declared as a configuration.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configured(_))
    }

    /// Returns true if the stage carries a rollback hook.
    #[must_use]
    pub fn has_rollback(&self) -> bool {
        match self {
            Self::Bare(_) => false,
            Self::Configured(config) => config.has_rollback(),
        }
    }

    /// Returns the stage's display name.
    ///
    /// The configured name wins, then the handler's own name.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Bare(handler) => handler.name(),
            Self::Configured(config) => config.name(),
        }
    }

    /// Converts the stage into its configuration form.
    #[must_use]
    pub fn into_configuration(self) -> StageConfiguration<A, C> {
        match self {
            Self::Bare(handler) => StageConfiguration::from_handler(handler),
            Self::Configured(config) => config,
        }
    }
}

impl<A, C> From<StageConfiguration<A, C>> for Stage<A, C> {
    fn from(config: StageConfiguration<A, C>) -> Self {
        Self::Configured(config)
    }
}

impl<A, C> Clone for Stage<A, C> {
    fn clone(&self) -> Self {
        match self {
            Self::Bare(handler) => Self::Bare(Arc::clone(handler)),
            Self::Configured(config) => Self::Configured(config.clone()),
        }
    }
}

impl<A, C> Debug for Stage<A, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bare(_) => f.debug_tuple("Bare").field(&self.name()).finish(),
            Self::Configured(config) => f.debug_tuple("Configured").field(config).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Ledger {
        entries: Vec<String>,
    }

    fn record_entry(ctx: &mut Ledger, _meta: &PipelineMetadata<()>) -> StageResult {
        ctx.entries.push("entry".to_string());
        Ok(None)
    }

    #[test]
    fn test_bare_stage_is_not_configuration() {
        let stage = Stage::from_fn(record_entry);

        assert!(!stage.is_configuration());
        assert!(!stage.has_rollback());
        assert_eq!(stage.name(), "record_entry");
    }

    #[test]
    fn test_configured_stage_uses_explicit_name() {
        let stage: Stage<(), Ledger> = StageConfiguration::from_fn(record_entry)
            .with_name("ledger")
            .into();

        assert!(stage.is_configuration());
        assert_eq!(stage.name(), "ledger");
    }

    #[test]
    fn test_configured_stage_falls_back_to_handler_name() {
        let stage: Stage<(), Ledger> = StageConfiguration::from_fn(record_entry)
            .with_rollback_fn(|ctx, _meta| {
                ctx.entries.pop();
                Ok(())
            })
            .into();

        assert!(stage.has_rollback());
        assert_eq!(stage.name(), "record_entry");
    }

    #[test]
    fn test_name_is_stable_across_calls() {
        let stage = Stage::from_fn(|_ctx: &mut Ledger, _meta: &PipelineMetadata<()>| Ok(None));

        assert_eq!(stage.name(), stage.name());
    }

    struct AuditEntry;

    #[async_trait::async_trait]
    impl StageHandler<(), Ledger> for AuditEntry {
        async fn execute(&self, ctx: &mut Ledger, _meta: &PipelineMetadata<()>) -> StageResult {
            ctx.entries.push("audit".to_string());
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_configuration_wraps_custom_handler() {
        let config = StageConfiguration::new(AuditEntry);
        let mut ledger = Ledger::default();

        let output = config
            .handler()
            .execute(&mut ledger, &PipelineMetadata::new("audit", ()))
            .await
            .unwrap();

        assert!(output.is_none());
        assert_eq!(config.name(), "AuditEntry");
        assert!(!config.has_rollback());
        assert_eq!(ledger.entries, vec!["audit".to_string()]);
    }

    #[test]
    fn test_into_configuration_keeps_handler() {
        let stage = Stage::from_fn(record_entry);
        let config = stage.into_configuration();

        assert_eq!(config.name(), "record_entry");
        assert!(config.rollback().is_none());
    }
}
