//! Pipeline construction: the configuration object and a validating builder.

use super::executor::{Pipeline, ResultsValidator};
use super::initializer::{AsyncFnInitializer, FnInitializer, Initializer};
use crate::core::{PartialResults, PipelineMetadata, StageResult};
use crate::errors::PipelineValidationError;
use crate::interceptors::{HookMiddleware, Middleware, MiddlewareChain, StageHooks};
use crate::stages::Stage;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

/// Everything a pipeline is built from.
pub struct PipelineConfig<A, C> {
    /// Pipeline name, prefixed onto every error message.
    pub name: String,
    /// Produces the context of each invocation.
    pub initializer: Arc<dyn Initializer<A, C>>,
    /// Stages in execution order. May be empty.
    pub stages: Vec<Stage<A, C>>,
    /// Decides whether the accumulated results are complete.
    pub results_validator: ResultsValidator,
    /// Middleware, first entry outermost.
    pub middleware: Vec<Arc<dyn Middleware<A, C>>>,
}

impl<A, C> std::fmt::Debug for PipelineConfig<A, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("name", &self.name)
            .field("stages", &self.stages)
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

/// Builds a pipeline from its configuration.
#[must_use]
pub fn build_pipeline<A, C, R>(config: PipelineConfig<A, C>) -> Pipeline<A, C, R>
where
    A: Send + Sync + 'static,
    C: Send + 'static,
    R: DeserializeOwned,
{
    Pipeline::from_parts(
        config.name,
        config.initializer,
        config.stages,
        MiddlewareChain::from(config.middleware),
        config.results_validator,
    )
}

/// Fluent builder for pipelines.
///
/// ```ignore
/// let pipeline = PipelineBuilder::<Args, Ctx, Output>::new("checkout")
///     .initializer(|args| Ok(Ctx::new(args)))
///     .stage_fn(reserve_stock)
///     .stage(StageConfiguration::from_fn(charge_card).with_rollback_fn(refund))
///     .middleware(TimingMiddleware::default())
///     .results_validator(|results| results.contains_key("receipt"))
///     .build()?;
/// ```
pub struct PipelineBuilder<A, C, R> {
    name: String,
    initializer: Option<Arc<dyn Initializer<A, C>>>,
    stages: Vec<Stage<A, C>>,
    middleware: Vec<Arc<dyn Middleware<A, C>>>,
    validator: Option<ResultsValidator>,
    _result: PhantomData<fn() -> R>,
}

impl<A, C, R> PipelineBuilder<A, C, R>
where
    A: Send + Sync + 'static,
    C: Send + 'static,
    R: DeserializeOwned,
{
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initializer: None,
            stages: Vec::new(),
            middleware: Vec::new(),
            validator: None,
            _result: PhantomData,
        }
    }

    /// Sets the initializer.
    #[must_use]
    pub fn initializer_handler(mut self, initializer: impl Initializer<A, C> + 'static) -> Self {
        self.initializer = Some(Arc::new(initializer));
        self
    }

    /// Sets a synchronous initializer function.
    #[must_use]
    pub fn initializer<F>(self, func: F) -> Self
    where
        F: Fn(&A) -> anyhow::Result<C> + Send + Sync + 'static,
    {
        self.initializer_handler(FnInitializer::new(func))
    }

    /// Sets an async initializer function.
    #[must_use]
    pub fn async_initializer<F>(self, func: F) -> Self
    where
        F: for<'a> Fn(&'a A) -> BoxFuture<'a, anyhow::Result<C>> + Send + Sync + 'static,
    {
        self.initializer_handler(AsyncFnInitializer::new(func))
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage(mut self, stage: impl Into<Stage<A, C>>) -> Self {
        self.stages.push(stage.into());
        self
    }

    /// Appends a bare stage built from a synchronous function.
    #[must_use]
    pub fn stage_fn<F>(self, func: F) -> Self
    where
        F: Fn(&mut C, &PipelineMetadata<A>) -> StageResult + Send + Sync + 'static,
    {
        self.stage(Stage::from_fn(func))
    }

    /// Appends a bare stage built from an async function.
    #[must_use]
    pub fn stage_async_fn<F>(self, func: F) -> Self
    where
        F: for<'a> Fn(&'a mut C, &'a PipelineMetadata<A>) -> BoxFuture<'a, StageResult>
            + Send
            + Sync
            + 'static,
    {
        self.stage(Stage::from_async_fn(func))
    }

    /// Appends several stages.
    #[must_use]
    pub fn stages(mut self, stages: impl IntoIterator<Item = Stage<A, C>>) -> Self {
        self.stages.extend(stages);
        self
    }

    /// Appends a middleware layer inside the ones added before it.
    #[must_use]
    pub fn middleware(mut self, layer: impl Middleware<A, C> + 'static) -> Self {
        self.middleware.push(Arc::new(layer));
        self
    }

    /// Appends a shared middleware layer.
    #[must_use]
    pub fn middleware_arc(mut self, layer: Arc<dyn Middleware<A, C>>) -> Self {
        self.middleware.push(layer);
        self
    }

    /// Appends event-style hooks as a middleware layer.
    #[must_use]
    pub fn hooks(self, hooks: impl StageHooks<A, C> + 'static) -> Self {
        self.middleware(HookMiddleware::new(hooks))
    }

    /// Sets the results validator.
    #[must_use]
    pub fn results_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&PartialResults) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Validates the definition and builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or the initializer or the
    /// results validator is missing.
    pub fn build(self) -> Result<Pipeline<A, C, R>, PipelineValidationError> {
        Ok(build_pipeline(self.into_config()?))
    }

    /// Validates the definition and returns it as a [`PipelineConfig`].
    ///
    /// # Errors
    ///
    /// Same as [`PipelineBuilder::build`].
    pub fn into_config(self) -> Result<PipelineConfig<A, C>, PipelineValidationError> {
        if self.name.trim().is_empty() {
            return Err(PipelineValidationError::missing_name());
        }
        let initializer = self
            .initializer
            .ok_or_else(|| PipelineValidationError::missing_initializer(&self.name))?;
        let results_validator = self
            .validator
            .ok_or_else(|| PipelineValidationError::missing_validator(&self.name))?;

        Ok(PipelineConfig {
            name: self.name,
            initializer,
            stages: self.stages,
            results_validator,
            middleware: self.middleware,
        })
    }
}

impl<A, C, R> std::fmt::Debug for PipelineBuilder<A, C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("name", &self.name)
            .field("stages", &self.stages)
            .field("middleware", &self.middleware.len())
            .field("has_initializer", &self.initializer.is_some())
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        addition_stage, initialize_context, return_history_result, return_sum_result,
        validate_results, TestArguments, TestContext, TestResults,
    };

    type Builder = PipelineBuilder<TestArguments, TestContext, TestResults>;

    #[test]
    fn test_build_requires_name() {
        let err = Builder::new("  ")
            .initializer(initialize_context)
            .results_validator(validate_results)
            .build()
            .unwrap_err();

        assert_eq!(err.code(), Some("PIPELINE-001-NAME"));
    }

    #[test]
    fn test_build_requires_initializer() {
        let err = Builder::new("TestPipeline")
            .results_validator(validate_results)
            .build()
            .unwrap_err();

        assert_eq!(err.code(), Some("PIPELINE-002-INITIALIZER"));
        assert!(err.error_info.unwrap().fix_hint.is_some());
    }

    #[test]
    fn test_build_requires_validator() {
        let err = Builder::new("TestPipeline")
            .initializer(initialize_context)
            .build()
            .unwrap_err();

        assert_eq!(err.code(), Some("PIPELINE-003-VALIDATOR"));
    }

    #[test]
    fn test_stage_names_are_computed_at_build() {
        let pipeline = Builder::new("TestPipeline")
            .initializer(initialize_context)
            .stage_fn(addition_stage)
            .stage(Stage::from_fn(return_sum_result))
            .stages([Stage::from_fn(return_history_result)])
            .results_validator(validate_results)
            .build()
            .unwrap();

        assert_eq!(pipeline.name(), "TestPipeline");
        assert_eq!(
            pipeline.stage_names(),
            ["addition_stage", "return_sum_result", "return_history_result"]
        );
    }

    #[tokio::test]
    async fn test_build_pipeline_from_config() {
        let config = PipelineConfig {
            name: "TestPipeline".to_string(),
            initializer: Arc::new(FnInitializer::new(initialize_context)),
            stages: vec![
                Stage::from_fn(addition_stage),
                Stage::from_fn(return_sum_result),
                Stage::from_fn(return_history_result),
            ],
            results_validator: Arc::new(validate_results),
            middleware: Vec::new(),
        };
        let pipeline: Pipeline<_, _, TestResults> = build_pipeline(config);

        let output = pipeline.run(TestArguments { increment: 2 }).await.unwrap();

        assert_eq!(
            output,
            TestResults {
                sum: 2,
                history: vec![0, 2]
            }
        );
    }
}
