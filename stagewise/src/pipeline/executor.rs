//! Sequential stage execution with middleware, result merging and rollback.

use super::initializer::Initializer;
use super::rollback::ProcessedStages;
use crate::core::{merge_partial, PartialResults, PipelineMetadata};
use crate::errors::{
    ExecutionError, PipelineData, PipelineError, PipelineRollbackError, ResultsValidationError,
};
use crate::interceptors::{MiddlewareChain, MiddlewarePayload};
use crate::stages::{Stage, StageConfiguration};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info_span, warn, Instrument};

/// Decides whether the accumulated results form a complete result.
pub type ResultsValidator = Arc<dyn Fn(&PartialResults) -> bool + Send + Sync>;

struct PipelineInner<A, C> {
    name: String,
    initializer: Arc<dyn Initializer<A, C>>,
    stages: Vec<StageConfiguration<A, C>>,
    stage_names: Vec<String>,
    middleware: MiddlewareChain<A, C>,
    validator: ResultsValidator,
}

/// A built pipeline.
///
/// Each call to [`Pipeline::run`] is an independent invocation with its own
/// metadata, context and results, so one pipeline can serve many concurrent
/// invocations. Cloning is cheap.
pub struct Pipeline<A, C, R> {
    inner: Arc<PipelineInner<A, C>>,
    _result: PhantomData<fn() -> R>,
}

impl<A, C, R> Pipeline<A, C, R>
where
    A: Send + Sync + 'static,
    C: Send + 'static,
    R: DeserializeOwned,
{
    pub(crate) fn from_parts(
        name: String,
        initializer: Arc<dyn Initializer<A, C>>,
        stages: Vec<Stage<A, C>>,
        middleware: MiddlewareChain<A, C>,
        validator: ResultsValidator,
    ) -> Self {
        let stages: Vec<_> = stages.into_iter().map(Stage::into_configuration).collect();
        let stage_names = stages.iter().map(StageConfiguration::name).collect();

        Self {
            inner: Arc::new(PipelineInner {
                name,
                initializer,
                stages,
                stage_names,
                middleware,
                validator,
            }),
            _result: PhantomData,
        }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> &[String] {
        &self.inner.stage_names
    }

    /// Runs one invocation of the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Pipeline`] if the initializer, a stage, a
    /// middleware layer or validation failed and the rollback succeeded, and
    /// [`ExecutionError::Rollback`] if a rollback hook failed as well.
    pub async fn run(&self, arguments: A) -> Result<R, ExecutionError<A, C>> {
        let metadata = PipelineMetadata::new(self.inner.name.clone(), arguments);
        let span = info_span!(
            "pipeline",
            name = %metadata.name(),
            run_id = %metadata.run_id()
        );

        self.execute(metadata).instrument(span).await
    }

    /// Runs one invocation on the tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(&self, arguments: A) -> JoinHandle<Result<R, ExecutionError<A, C>>>
    where
        R: Send + 'static,
    {
        let pipeline = self.clone();
        tokio::spawn(async move { pipeline.run(arguments).await })
    }

    async fn execute(&self, metadata: PipelineMetadata<A>) -> Result<R, ExecutionError<A, C>> {
        let mut context = match self.inner.initializer.initialize(metadata.arguments()).await {
            Ok(context) => context,
            Err(cause) => {
                warn!(error = %format!("{cause:#}"), "initializer failed");
                let data = PipelineData {
                    context: None,
                    results: PartialResults::new(),
                    metadata,
                };
                return Err(PipelineError::new(data, cause).into());
            }
        };

        let mut results = PartialResults::new();
        let mut processed = ProcessedStages::new();

        let outcome = self
            .run_stages(&mut context, &metadata, &mut results, &mut processed)
            .await
            .and_then(|()| self.validate(&results));

        match outcome {
            Ok(output) => {
                debug!("pipeline completed");
                Ok(output)
            }
            Err(cause) => Err(self.fail(processed, context, results, metadata, cause).await),
        }
    }

    async fn run_stages<'p>(
        &'p self,
        context: &mut C,
        metadata: &PipelineMetadata<A>,
        results: &mut PartialResults,
        processed: &mut ProcessedStages<'p, A, C>,
    ) -> anyhow::Result<()> {
        let inner = &*self.inner;

        for (stage, name) in inner.stages.iter().zip(&inner.stage_names) {
            processed.push(stage);
            debug!(stage = %name, "stage starting");

            let mut payload = MiddlewarePayload {
                context: &mut *context,
                metadata,
                results: &*results,
                stage_names: &inner.stage_names,
                current_stage: name,
            };
            let output = inner.middleware.invoke(stage, &mut payload).await?;

            if let Some(partial) = output {
                merge_partial(results, name, partial)?;
            }
            debug!(stage = %name, "stage completed");
        }

        Ok(())
    }

    fn validate(&self, results: &PartialResults) -> anyhow::Result<R> {
        if !(self.inner.validator)(results) {
            return Err(ResultsValidationError::Rejected.into());
        }

        serde_json::from_value(Value::Object(results.clone()))
            .map_err(|err| ResultsValidationError::Shape(err).into())
    }

    async fn fail(
        &self,
        processed: ProcessedStages<'_, A, C>,
        mut context: C,
        results: PartialResults,
        metadata: PipelineMetadata<A>,
        cause: anyhow::Error,
    ) -> ExecutionError<A, C> {
        warn!(
            error = %format!("{cause:#}"),
            processed = processed.len(),
            "pipeline failed, rolling back"
        );
        let rollback = processed.rollback(&mut context, &metadata).await;

        let error = PipelineError::new(
            PipelineData {
                context: Some(context),
                results,
                metadata,
            },
            cause,
        );

        match rollback {
            Ok(rolled_back) => {
                debug!(?rolled_back, "rollback completed");
                error.into()
            }
            Err(failure) => PipelineRollbackError::new(error, failure).into(),
        }
    }
}

impl<A, C, R> Clone for Pipeline<A, C, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _result: PhantomData,
        }
    }
}

impl<A, C, R> std::fmt::Debug for Pipeline<A, C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.inner.name)
            .field("stages", &self.inner.stage_names)
            .field("middleware", &self.inner.middleware.len())
            .finish()
    }
}
