//! Middleware chain for onion-style stage execution.

use crate::core::{PartialResults, PipelineMetadata, StageResult};
use crate::stages::StageConfiguration;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;

/// What every middleware layer sees for the stage it wraps.
pub struct MiddlewarePayload<'a, A, C> {
    /// The invocation's shared mutable context.
    pub context: &'a mut C,
    /// The invocation's metadata.
    pub metadata: &'a PipelineMetadata<A>,
    /// Results merged so far, before the current stage.
    pub results: &'a PartialResults,
    /// Names of every stage in the pipeline, in declared order.
    pub stage_names: &'a [String],
    /// Name of the stage being wrapped.
    pub current_stage: &'a str,
}

/// Trait for cross-cutting layers wrapped around each stage call.
///
/// A layer may do work before and after calling [`Next::run`], or
/// short-circuit the stage by returning without calling it. Errors
/// propagate exactly like errors from the stage itself.
#[async_trait]
pub trait Middleware<A, C>: Send + Sync {
    /// Handles one stage call.
    async fn handle(&self, payload: &mut MiddlewarePayload<'_, A, C>, next: Next<'_, A, C>)
        -> StageResult;
}

/// Continuation to the next inner layer.
///
/// Dispatches to the next middleware in the chain, or to the stage itself
/// once every middleware has been entered.
pub struct Next<'a, A, C> {
    layers: &'a [Arc<dyn Middleware<A, C>>],
    stage: &'a StageConfiguration<A, C>,
}

impl<'a, A, C> Next<'a, A, C> {
    /// Creates the outermost continuation for a stage.
    #[must_use]
    pub fn new(layers: &'a [Arc<dyn Middleware<A, C>>], stage: &'a StageConfiguration<A, C>) -> Self {
        Self { layers, stage }
    }

    /// Invokes the next inner layer.
    pub fn run<'b>(self, payload: &'b mut MiddlewarePayload<'_, A, C>) -> BoxFuture<'b, StageResult>
    where
        'a: 'b,
    {
        match self.layers.split_first() {
            Some((layer, inner)) => layer.handle(
                payload,
                Next {
                    layers: inner,
                    stage: self.stage,
                },
            ),
            None => self
                .stage
                .handler()
                .execute(&mut *payload.context, payload.metadata),
        }
    }
}

/// An ordered middleware list, first-registered outermost.
pub struct MiddlewareChain<A, C> {
    layers: Vec<Arc<dyn Middleware<A, C>>>,
}

impl<A, C> MiddlewareChain<A, C> {
    /// Creates a new empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Appends a layer inside every layer added before it.
    pub fn add(&mut self, layer: Arc<dyn Middleware<A, C>>) {
        self.layers.push(layer);
    }

    /// Wraps a stage call in every layer of the chain and runs it.
    pub fn invoke<'b>(
        &'b self,
        stage: &'b StageConfiguration<A, C>,
        payload: &'b mut MiddlewarePayload<'_, A, C>,
    ) -> BoxFuture<'b, StageResult> {
        Next::new(&self.layers, stage).run(payload)
    }

    /// Returns the number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns true if the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl<A, C> Default for MiddlewareChain<A, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, C> Clone for MiddlewareChain<A, C> {
    fn clone(&self) -> Self {
        Self {
            layers: self.layers.clone(),
        }
    }
}

impl<A, C> From<Vec<Arc<dyn Middleware<A, C>>>> for MiddlewareChain<A, C> {
    fn from(layers: Vec<Arc<dyn Middleware<A, C>>>) -> Self {
        Self { layers }
    }
}

impl<A, C> std::fmt::Debug for MiddlewareChain<A, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("layers", &self.layers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CallLog, RecordingMiddleware, ShortCircuitMiddleware};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Ctx {
        touched: bool,
    }

    fn stage_touching(log: CallLog) -> StageConfiguration<(), Ctx> {
        StageConfiguration::from_fn(move |ctx: &mut Ctx, _meta: &PipelineMetadata<()>| {
            log.push("stage");
            ctx.touched = true;
            Ok(Some(json!({"touched": true})))
        })
    }

    async fn invoke(chain: &MiddlewareChain<(), Ctx>, stage: &StageConfiguration<(), Ctx>, ctx: &mut Ctx) -> StageResult {
        let metadata = PipelineMetadata::new("chain", ());
        let results = PartialResults::new();
        let names = vec![stage.name()];
        let current = stage.name();
        let mut payload = MiddlewarePayload {
            context: ctx,
            metadata: &metadata,
            results: &results,
            stage_names: &names,
            current_stage: &current,
        };
        chain.invoke(stage, &mut payload).await
    }

    #[tokio::test]
    async fn test_empty_chain_runs_stage() {
        let log = CallLog::new();
        let chain = MiddlewareChain::new();
        let stage = stage_touching(log.clone());
        let mut ctx = Ctx::default();

        let output = invoke(&chain, &stage, &mut ctx).await.unwrap();

        assert!(chain.is_empty());
        assert!(ctx.touched);
        assert_eq!(output, Some(json!({"touched": true})));
        assert_eq!(log.entries(), vec!["stage"]);
    }

    #[tokio::test]
    async fn test_first_registered_is_outermost() {
        let log = CallLog::new();
        let mut chain = MiddlewareChain::new();
        chain.add(Arc::new(RecordingMiddleware::new("m1", log.clone())));
        chain.add(Arc::new(RecordingMiddleware::new("m2", log.clone())));
        let stage = stage_touching(log.clone());
        let mut ctx = Ctx::default();

        invoke(&chain, &stage, &mut ctx).await.unwrap();

        assert_eq!(chain.len(), 2);
        assert_eq!(
            log.entries(),
            vec!["m1-before", "m2-before", "stage", "m2-after", "m1-after"]
        );
    }

    #[tokio::test]
    async fn test_short_circuit_skips_stage() {
        let log = CallLog::new();
        let mut chain = MiddlewareChain::new();
        chain.add(Arc::new(RecordingMiddleware::new("outer", log.clone())));
        chain.add(Arc::new(ShortCircuitMiddleware::new(Some(json!({"cached": 1})))));
        chain.add(Arc::new(RecordingMiddleware::new("inner", log.clone())));
        let stage = stage_touching(log.clone());
        let mut ctx = Ctx::default();

        let output = invoke(&chain, &stage, &mut ctx).await.unwrap();

        assert!(!ctx.touched);
        assert_eq!(output, Some(json!({"cached": 1})));
        assert_eq!(log.entries(), vec!["outer-before", "outer-after"]);
    }
}
