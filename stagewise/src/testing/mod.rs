//! Testing utilities for stagewise pipelines.
//!
//! This module provides:
//! - The counter pipeline fixture and its stages
//! - Mock middleware and a shared call log
//! - Assertions for pipeline outcomes

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_calls, assert_pipeline_error, assert_rollback_error};
pub use fixtures::{
    addition_stage, error_stage, initialize_context, noop_stage, return_history_result,
    return_sum_result, stage_with_failing_rollback, stage_with_rollback, successful_stages,
    test_pipeline, test_pipeline_builder, validate_results, TestArguments, TestContext,
    TestPipeline, TestResults, TestStage, TEST_PIPELINE_NAME,
};
pub use mocks::{CallLog, FailingMiddleware, RecordingMiddleware, ShortCircuitMiddleware};
