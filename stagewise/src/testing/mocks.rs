//! Mock middleware and a shared call log for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use crate::core::StageResult;
use crate::interceptors::{Middleware, MiddlewarePayload, Next};
use crate::observability::LogFn;

/// An ordered, shareable record of calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Returns a copy of the entries.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Returns how many times `entry` was recorded.
    #[must_use]
    pub fn count(&self, entry: &str) -> usize {
        self.entries.lock().iter().filter(|e| *e == entry).count()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Returns a [`LogFn`] that records every message.
    #[must_use]
    pub fn log_fn(&self) -> LogFn {
        let log = self.clone();
        Arc::new(move |message: &str| log.push(message))
    }
}

/// Records `<label>-before` and `<label>-after` around the inner layers.
#[derive(Debug, Clone)]
pub struct RecordingMiddleware {
    label: String,
    log: CallLog,
}

impl RecordingMiddleware {
    /// Creates a recording middleware.
    #[must_use]
    pub fn new(label: impl Into<String>, log: CallLog) -> Self {
        Self {
            label: label.into(),
            log,
        }
    }
}

#[async_trait]
impl<A, C> Middleware<A, C> for RecordingMiddleware
where
    A: Send + Sync + 'static,
    C: Send + 'static,
{
    async fn handle(
        &self,
        payload: &mut MiddlewarePayload<'_, A, C>,
        next: Next<'_, A, C>,
    ) -> StageResult {
        self.log.push(format!("{}-before", self.label));
        let output = next.run(payload).await?;
        self.log.push(format!("{}-after", self.label));
        Ok(output)
    }
}

/// Returns a fixed output without calling the inner layers.
#[derive(Debug, Clone, Default)]
pub struct ShortCircuitMiddleware {
    output: Option<Value>,
}

impl ShortCircuitMiddleware {
    /// Creates a middleware that always returns `output`.
    #[must_use]
    pub fn new(output: Option<Value>) -> Self {
        Self { output }
    }
}

#[async_trait]
impl<A, C> Middleware<A, C> for ShortCircuitMiddleware
where
    A: Send + Sync + 'static,
    C: Send + 'static,
{
    async fn handle(
        &self,
        _payload: &mut MiddlewarePayload<'_, A, C>,
        _next: Next<'_, A, C>,
    ) -> StageResult {
        Ok(self.output.clone())
    }
}

/// Fails before or after calling the inner layers.
#[derive(Debug, Clone)]
pub struct FailingMiddleware {
    message: String,
    after_stage: bool,
}

impl FailingMiddleware {
    /// Fails without running the stage.
    #[must_use]
    pub fn before(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            after_stage: false,
        }
    }

    /// Runs the stage, then fails.
    #[must_use]
    pub fn after(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            after_stage: true,
        }
    }
}

#[async_trait]
impl<A, C> Middleware<A, C> for FailingMiddleware
where
    A: Send + Sync + 'static,
    C: Send + 'static,
{
    async fn handle(
        &self,
        payload: &mut MiddlewarePayload<'_, A, C>,
        next: Next<'_, A, C>,
    ) -> StageResult {
        if self.after_stage {
            next.run(payload).await?;
        }
        anyhow::bail!("{}", self.message)
    }
}
