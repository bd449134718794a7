//! Event-style middleware built from start/complete callbacks.

use super::chain::{Middleware, MiddlewarePayload, Next};
use crate::core::StageResult;
use async_trait::async_trait;
use serde_json::Value;

/// Callbacks run around each stage.
///
/// Both callbacks are optional. An error returned from either fails the
/// stage like an error from the stage itself.
pub trait StageHooks<A, C>: Send + Sync {
    /// Runs before the stage (and every inner layer) starts.
    fn on_stage_start(&self, _payload: &MiddlewarePayload<'_, A, C>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs after the stage completed, with the partial result it returned.
    fn on_stage_complete(
        &self,
        _payload: &MiddlewarePayload<'_, A, C>,
        _output: Option<&Value>,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Adapts a [`StageHooks`] implementation into a middleware layer.
#[derive(Debug, Clone, Default)]
pub struct HookMiddleware<H> {
    hooks: H,
}

impl<H> HookMiddleware<H> {
    /// Wraps the hooks.
    #[must_use]
    pub const fn new(hooks: H) -> Self {
        Self { hooks }
    }
}

#[async_trait]
impl<A, C, H> Middleware<A, C> for HookMiddleware<H>
where
    A: Send + Sync + 'static,
    C: Send + 'static,
    H: StageHooks<A, C>,
{
    async fn handle(
        &self,
        payload: &mut MiddlewarePayload<'_, A, C>,
        next: Next<'_, A, C>,
    ) -> StageResult {
        self.hooks.on_stage_start(payload)?;
        let output = next.run(payload).await?;
        self.hooks.on_stage_complete(payload, output.as_ref())?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PartialResults, PipelineMetadata};
    use crate::interceptors::MiddlewareChain;
    use crate::stages::StageConfiguration;
    use crate::testing::CallLog;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    struct Recorder {
        log: CallLog,
    }

    impl StageHooks<(), ()> for Recorder {
        fn on_stage_start(&self, payload: &MiddlewarePayload<'_, (), ()>) -> anyhow::Result<()> {
            self.log.push(format!("start {}", payload.current_stage));
            Ok(())
        }

        fn on_stage_complete(
            &self,
            payload: &MiddlewarePayload<'_, (), ()>,
            output: Option<&Value>,
        ) -> anyhow::Result<()> {
            self.log
                .push(format!("complete {} {:?}", payload.current_stage, output));
            Ok(())
        }
    }

    struct CompleteOnly {
        log: CallLog,
    }

    impl StageHooks<(), ()> for CompleteOnly {
        fn on_stage_complete(
            &self,
            _payload: &MiddlewarePayload<'_, (), ()>,
            _output: Option<&Value>,
        ) -> anyhow::Result<()> {
            self.log.push("complete");
            Ok(())
        }
    }

    struct RejectingStart;

    impl StageHooks<(), ()> for RejectingStart {
        fn on_stage_start(&self, _payload: &MiddlewarePayload<'_, (), ()>) -> anyhow::Result<()> {
            anyhow::bail!("not allowed")
        }
    }

    async fn run_chain(chain: MiddlewareChain<(), ()>, log: CallLog) -> StageResult {
        let stage = StageConfiguration::from_fn(move |_ctx: &mut (), _meta: &PipelineMetadata<()>| {
            log.push("stage");
            Ok(Some(json!({"n": 1})))
        })
        .with_name("count");
        let metadata = PipelineMetadata::new("hooks", ());
        let results = PartialResults::new();
        let names = vec!["count".to_string()];
        let mut ctx = ();
        let mut payload = MiddlewarePayload {
            context: &mut ctx,
            metadata: &metadata,
            results: &results,
            stage_names: &names,
            current_stage: "count",
        };
        chain.invoke(&stage, &mut payload).await
    }

    #[tokio::test]
    async fn test_hooks_run_around_stage() {
        let log = CallLog::new();
        let mut chain = MiddlewareChain::new();
        chain.add(Arc::new(HookMiddleware::new(Recorder { log: log.clone() })));

        run_chain(chain, log.clone()).await.unwrap();

        assert_eq!(
            log.entries(),
            vec![
                "start count".to_string(),
                "stage".to_string(),
                format!("complete count {:?}", Some(&json!({"n": 1}))),
            ]
        );
    }

    #[tokio::test]
    async fn test_partial_hooks_use_defaults() {
        let log = CallLog::new();
        let mut chain = MiddlewareChain::new();
        chain.add(Arc::new(HookMiddleware::new(CompleteOnly { log: log.clone() })));

        run_chain(chain, log.clone()).await.unwrap();

        assert_eq!(log.entries(), vec!["stage", "complete"]);
    }

    #[tokio::test]
    async fn test_failing_start_hook_prevents_stage() {
        let log = CallLog::new();
        let mut chain = MiddlewareChain::new();
        chain.add(Arc::new(HookMiddleware::new(RejectingStart)));

        let err = run_chain(chain, log.clone()).await.unwrap_err();

        assert_eq!(err.to_string(), "not allowed");
        assert!(log.is_empty());
    }
}
