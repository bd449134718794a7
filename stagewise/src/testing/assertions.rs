//! Test assertions for pipeline outcomes.

use crate::errors::{ExecutionError, PipelineError, PipelineRollbackError};

use super::mocks::CallLog;

/// Asserts that the invocation failed without a rollback failure and that
/// the message contains `needle`.
pub fn assert_pipeline_error<'e, A, C>(
    err: &'e ExecutionError<A, C>,
    needle: &str,
) -> &'e PipelineError<A, C> {
    let ExecutionError::Pipeline(inner) = err else {
        panic!("Expected a pipeline error, got: {}", err.message());
    };
    assert!(
        inner.message().contains(needle),
        "Expected message containing '{}', got: {}",
        needle,
        inner.message()
    );
    inner
}

/// Asserts that the rollback hook of `stage` failed.
pub fn assert_rollback_error<'e, A, C>(
    err: &'e ExecutionError<A, C>,
    stage: &str,
) -> &'e PipelineRollbackError<A, C> {
    let ExecutionError::Rollback(inner) = err else {
        panic!("Expected a rollback error, got: {}", err.message());
    };
    assert_eq!(
        inner.stage(),
        stage,
        "Expected rollback of '{}' to fail, got: {}",
        stage,
        inner.message()
    );
    inner
}

/// Asserts that the log holds exactly `expected`, in order.
pub fn assert_calls(log: &CallLog, expected: &[&str]) {
    let entries = log.entries();
    assert_eq!(
        entries, expected,
        "Expected calls {:?}, got {:?}",
        expected, entries
    );
}
