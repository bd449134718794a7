//! Stage handlers and their closure adapters.
//!
//! Stages are the units of work of a pipeline. A stage handler receives the
//! invocation's mutable context and its metadata, and may hand back a partial
//! result. A rollback handler compensates the external side effects of a
//! stage when a later step of the invocation fails.

mod config;
mod naming;

pub use config::{Stage, StageConfiguration};
pub use naming::{short_type_name, type_display_name};

use crate::core::{PipelineMetadata, StageResult};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt::Debug;
use std::marker::PhantomData;

/// Trait for the execute side of a pipeline stage.
#[async_trait]
pub trait StageHandler<A, C>: Send + Sync {
    /// Returns the name used in logs and middleware payloads.
    ///
    /// Defaults to the short type name of the handler.
    fn name(&self) -> String {
        type_display_name::<Self>()
    }

    /// Executes the stage.
    ///
    /// # Arguments
    ///
    /// * `context` - The invocation's shared mutable context
    /// * `metadata` - The invocation's metadata
    async fn execute(&self, context: &mut C, metadata: &PipelineMetadata<A>) -> StageResult;
}

/// Trait for a stage's compensating action.
#[async_trait]
pub trait RollbackHandler<A, C>: Send + Sync {
    /// Undoes the external side effects of the stage.
    async fn rollback(&self, context: &mut C, metadata: &PipelineMetadata<A>)
        -> anyhow::Result<()>;
}

/// A synchronous function-based stage.
pub struct FnStage<A, C, F> {
    func: F,
    _phantom: PhantomData<fn(&mut C, &A)>,
}

impl<A, C, F> FnStage<A, C, F> {
    /// Creates a new function-based stage.
    pub fn new(func: F) -> Self
    where
        F: Fn(&mut C, &PipelineMetadata<A>) -> StageResult + Send + Sync,
    {
        Self {
            func,
            _phantom: PhantomData,
        }
    }
}

impl<A, C, F> Debug for FnStage<A, C, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage")
            .field("func", &type_display_name::<F>())
            .finish()
    }
}

#[async_trait]
impl<A, C, F> StageHandler<A, C> for FnStage<A, C, F>
where
    A: Send + Sync + 'static,
    C: Send + 'static,
    F: Fn(&mut C, &PipelineMetadata<A>) -> StageResult + Send + Sync,
{
    fn name(&self) -> String {
        type_display_name::<F>()
    }

    async fn execute(&self, context: &mut C, metadata: &PipelineMetadata<A>) -> StageResult {
        (self.func)(context, metadata)
    }
}

/// An async function-based stage.
///
/// The function returns a boxed future borrowing the context and metadata,
/// e.g. `|ctx, meta| Box::pin(async move { ... })`.
pub struct AsyncFnStage<A, C, F> {
    func: F,
    _phantom: PhantomData<fn(&mut C, &A)>,
}

impl<A, C, F> AsyncFnStage<A, C, F> {
    /// Creates a new async function-based stage.
    pub fn new(func: F) -> Self
    where
        F: for<'a> Fn(&'a mut C, &'a PipelineMetadata<A>) -> BoxFuture<'a, StageResult>
            + Send
            + Sync,
    {
        Self {
            func,
            _phantom: PhantomData,
        }
    }
}

impl<A, C, F> Debug for AsyncFnStage<A, C, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFnStage")
            .field("func", &type_display_name::<F>())
            .finish()
    }
}

#[async_trait]
impl<A, C, F> StageHandler<A, C> for AsyncFnStage<A, C, F>
where
    A: Send + Sync + 'static,
    C: Send + 'static,
    F: for<'a> Fn(&'a mut C, &'a PipelineMetadata<A>) -> BoxFuture<'a, StageResult> + Send + Sync,
{
    fn name(&self) -> String {
        type_display_name::<F>()
    }

    async fn execute(&self, context: &mut C, metadata: &PipelineMetadata<A>) -> StageResult {
        (self.func)(context, metadata).await
    }
}

/// A synchronous function-based rollback hook.
pub struct FnRollback<A, C, F> {
    func: F,
    _phantom: PhantomData<fn(&mut C, &A)>,
}

impl<A, C, F> FnRollback<A, C, F> {
    /// Creates a new function-based rollback hook.
    pub fn new(func: F) -> Self
    where
        F: Fn(&mut C, &PipelineMetadata<A>) -> anyhow::Result<()> + Send + Sync,
    {
        Self {
            func,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<A, C, F> RollbackHandler<A, C> for FnRollback<A, C, F>
where
    A: Send + Sync + 'static,
    C: Send + 'static,
    F: Fn(&mut C, &PipelineMetadata<A>) -> anyhow::Result<()> + Send + Sync,
{
    async fn rollback(
        &self,
        context: &mut C,
        metadata: &PipelineMetadata<A>,
    ) -> anyhow::Result<()> {
        (self.func)(context, metadata)
    }
}

/// An async function-based rollback hook.
pub struct AsyncFnRollback<A, C, F> {
    func: F,
    _phantom: PhantomData<fn(&mut C, &A)>,
}

impl<A, C, F> AsyncFnRollback<A, C, F> {
    /// Creates a new async function-based rollback hook.
    pub fn new(func: F) -> Self
    where
        F: for<'a> Fn(&'a mut C, &'a PipelineMetadata<A>) -> BoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync,
    {
        Self {
            func,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<A, C, F> RollbackHandler<A, C> for AsyncFnRollback<A, C, F>
where
    A: Send + Sync + 'static,
    C: Send + 'static,
    F: for<'a> Fn(&'a mut C, &'a PipelineMetadata<A>) -> BoxFuture<'a, anyhow::Result<()>>
        + Send
        + Sync,
{
    async fn rollback(
        &self,
        context: &mut C,
        metadata: &PipelineMetadata<A>,
    ) -> anyhow::Result<()> {
        (self.func)(context, metadata).await
    }
}
