//! Tracing integration for stagewise pipelines.
//!
//! Stage logging middleware writes through an injected [`LogFn`]; the
//! default one forwards to the `tracing` ecosystem.

use std::sync::Arc;
use std::time::Instant;

/// Injected log function used by the logging middleware.
pub type LogFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Returns a [`LogFn`] that emits each message as an `info` event.
#[must_use]
pub fn tracing_log_fn() -> LogFn {
    Arc::new(|message: &str| {
        ::tracing::info!(target: "stagewise::stage", "{}", message);
    })
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start("test_span");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(timer.name(), "test_span");
        let duration = timer.finish();
        assert!(duration >= 10.0);
    }

    #[test]
    fn test_tracing_log_fn_without_subscriber() {
        let log = tracing_log_fn();
        log("[test] nothing listens");
        // Should not panic
    }
}
