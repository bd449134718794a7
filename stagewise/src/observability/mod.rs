//! Observability utilities.

mod subscriber;
mod tracing;

pub use self::subscriber::{TracingConfig, FILTER_ENV};
pub use self::tracing::{tracing_log_fn, LogFn, SpanTimer};
