//! Logging middleware for stage start, completion and duration.

use super::chain::{Middleware, MiddlewarePayload, Next};
use crate::core::StageResult;
use crate::observability::{tracing_log_fn, LogFn, SpanTimer};
use async_trait::async_trait;

/// Logs when each stage starts and when it completes.
///
/// A stage that fails logs only its start line.
#[derive(Clone)]
pub struct LogStageMiddleware {
    log: LogFn,
}

impl LogStageMiddleware {
    /// Creates the middleware with a custom log function.
    #[must_use]
    pub fn new(log: LogFn) -> Self {
        Self { log }
    }
}

impl Default for LogStageMiddleware {
    fn default() -> Self {
        Self::new(tracing_log_fn())
    }
}

impl std::fmt::Debug for LogStageMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogStageMiddleware").finish_non_exhaustive()
    }
}

#[async_trait]
impl<A, C> Middleware<A, C> for LogStageMiddleware
where
    A: Send + Sync + 'static,
    C: Send + 'static,
{
    async fn handle(
        &self,
        payload: &mut MiddlewarePayload<'_, A, C>,
        next: Next<'_, A, C>,
    ) -> StageResult {
        (self.log)(&format!(
            "[{}] starting {}...",
            payload.metadata.name(),
            payload.current_stage
        ));
        let output = next.run(payload).await?;
        (self.log)(&format!(
            "[{}] {} completed",
            payload.metadata.name(),
            payload.current_stage
        ));
        Ok(output)
    }
}

/// Logs how long each stage took, whether it succeeded or failed.
#[derive(Clone)]
pub struct TimingMiddleware {
    log: LogFn,
}

impl TimingMiddleware {
    /// Creates the middleware with a custom log function.
    #[must_use]
    pub fn new(log: LogFn) -> Self {
        Self { log }
    }
}

impl Default for TimingMiddleware {
    fn default() -> Self {
        Self::new(tracing_log_fn())
    }
}

impl std::fmt::Debug for TimingMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimingMiddleware").finish_non_exhaustive()
    }
}

#[async_trait]
impl<A, C> Middleware<A, C> for TimingMiddleware
where
    A: Send + Sync + 'static,
    C: Send + 'static,
{
    async fn handle(
        &self,
        payload: &mut MiddlewarePayload<'_, A, C>,
        next: Next<'_, A, C>,
    ) -> StageResult {
        let timer = SpanTimer::start(payload.current_stage);
        let output = next.run(payload).await;
        (self.log)(&format!(
            "[{}] {} completed in {:.3}ms",
            payload.metadata.name(),
            timer.name(),
            timer.elapsed_ms()
        ));
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PartialResults, PipelineMetadata};
    use crate::interceptors::MiddlewareChain;
    use crate::stages::StageConfiguration;
    use crate::testing::CallLog;
    use std::sync::Arc;

    async fn run_with(layer: Arc<dyn Middleware<(), ()>>, fail: bool) -> StageResult {
        let stage = StageConfiguration::from_fn(move |_ctx: &mut (), _meta: &PipelineMetadata<()>| {
            if fail {
                anyhow::bail!("stage broke");
            }
            Ok(None)
        })
        .with_name("persist");
        let mut chain = MiddlewareChain::new();
        chain.add(layer);
        let metadata = PipelineMetadata::new("Orders", ());
        let results = PartialResults::new();
        let names = vec!["persist".to_string()];
        let mut ctx = ();
        let mut payload = MiddlewarePayload {
            context: &mut ctx,
            metadata: &metadata,
            results: &results,
            stage_names: &names,
            current_stage: "persist",
        };
        chain.invoke(&stage, &mut payload).await
    }

    #[tokio::test]
    async fn test_log_stage_messages() {
        let log = CallLog::new();
        let layer = Arc::new(LogStageMiddleware::new(log.log_fn()));

        run_with(layer, false).await.unwrap();

        assert_eq!(
            log.entries(),
            vec!["[Orders] starting persist...", "[Orders] persist completed"]
        );
    }

    #[tokio::test]
    async fn test_log_stage_skips_completion_on_failure() {
        let log = CallLog::new();
        let layer = Arc::new(LogStageMiddleware::new(log.log_fn()));

        assert!(run_with(layer, true).await.is_err());
        assert_eq!(log.entries(), vec!["[Orders] starting persist..."]);
    }

    #[tokio::test]
    async fn test_timing_logs_even_on_failure() {
        let log = CallLog::new();
        let layer = Arc::new(TimingMiddleware::new(log.log_fn()));

        let err = run_with(layer, true).await.unwrap_err();

        assert_eq!(err.to_string(), "stage broke");
        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].starts_with("[Orders] persist completed in "));
        assert!(entries[0].ends_with("ms"));
    }
}
