//! The counter pipeline used throughout the tests and benches.
//!
//! Each [`addition_stage`] appends `last + increment` to the context's running
//! sums. The result stages report the last sum and the whole history.

use crate::core::{PartialResults, PipelineMetadata, StageResult};
use crate::pipeline::{Pipeline, PipelineBuilder};
use crate::stages::{Stage, StageConfiguration};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::mocks::CallLog;

/// Name of the counter pipeline.
pub const TEST_PIPELINE_NAME: &str = "TestPipeline";

/// Arguments of the counter pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestArguments {
    /// Added to the last sum by every addition stage.
    pub increment: i64,
}

/// Context of the counter pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TestContext {
    /// Every sum computed so far, starting with 0.
    pub sums: Vec<i64>,
}

/// Result of the counter pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResults {
    /// The last sum.
    pub sum: i64,
    /// Every sum, in order.
    pub history: Vec<i64>,
}

/// A stage of the counter pipeline.
pub type TestStage = Stage<TestArguments, TestContext>;

/// The counter pipeline.
pub type TestPipeline = Pipeline<TestArguments, TestContext, TestResults>;

/// Creates the context with a single sum of 0.
pub fn initialize_context(_arguments: &TestArguments) -> anyhow::Result<TestContext> {
    Ok(TestContext { sums: vec![0] })
}

/// Appends `last + increment` to the sums.
pub fn addition_stage(
    context: &mut TestContext,
    metadata: &PipelineMetadata<TestArguments>,
) -> StageResult {
    let Some(last) = context.sums.last().copied() else {
        anyhow::bail!("No previous sum recorded!");
    };
    context.sums.push(last + metadata.arguments().increment);
    Ok(None)
}

/// Returns `{ "sum": <last sum> }`.
pub fn return_sum_result(
    context: &mut TestContext,
    _metadata: &PipelineMetadata<TestArguments>,
) -> StageResult {
    let Some(last) = context.sums.last() else {
        anyhow::bail!("No previous sum recorded!");
    };
    Ok(Some(json!({ "sum": last })))
}

/// Returns `{ "history": <all sums> }`.
pub fn return_history_result(
    context: &mut TestContext,
    _metadata: &PipelineMetadata<TestArguments>,
) -> StageResult {
    Ok(Some(json!({ "history": context.sums })))
}

/// Always fails.
pub fn error_stage(
    _context: &mut TestContext,
    _metadata: &PipelineMetadata<TestArguments>,
) -> StageResult {
    anyhow::bail!("This stage throws an error!")
}

/// Does nothing.
pub fn noop_stage(
    _context: &mut TestContext,
    _metadata: &PipelineMetadata<TestArguments>,
) -> StageResult {
    Ok(None)
}

/// Accepts results with a numeric `sum` and a `history` of numbers.
pub fn validate_results(results: &PartialResults) -> bool {
    let sum_ok = results.get("sum").is_some_and(Value::is_number);
    let history_ok = results
        .get("history")
        .and_then(Value::as_array)
        .is_some_and(|history| history.iter().all(Value::is_number));
    sum_ok && history_ok
}

/// A no-op stage named `name` whose rollback records `name` in `log`.
pub fn stage_with_rollback(
    name: impl Into<String>,
    log: &CallLog,
) -> StageConfiguration<TestArguments, TestContext> {
    let name = name.into();
    let log = log.clone();
    let label = name.clone();
    StageConfiguration::from_fn(noop_stage)
        .with_name(name)
        .with_rollback_fn(move |_ctx: &mut TestContext, _meta: &PipelineMetadata<TestArguments>| {
            log.push(label.clone());
            Ok(())
        })
}

/// A no-op stage named `name` whose rollback records `name` in `log` and
/// then fails.
pub fn stage_with_failing_rollback(
    name: impl Into<String>,
    log: &CallLog,
) -> StageConfiguration<TestArguments, TestContext> {
    let name = name.into();
    let log = log.clone();
    let label = name.clone();
    StageConfiguration::from_fn(noop_stage)
        .with_name(name)
        .with_rollback_fn(move |_ctx: &mut TestContext, _meta: &PipelineMetadata<TestArguments>| {
            log.push(label.clone());
            anyhow::bail!("Rollback of {label} failed")
        })
}

/// A builder for the counter pipeline with the given stages.
///
/// Add middleware to it, then call `build()`.
pub fn test_pipeline_builder(
    stages: impl IntoIterator<Item = TestStage>,
) -> PipelineBuilder<TestArguments, TestContext, TestResults> {
    PipelineBuilder::new(TEST_PIPELINE_NAME)
        .initializer(initialize_context)
        .stages(stages)
        .results_validator(validate_results)
}

/// Builds the counter pipeline with the given stages and no middleware.
///
/// # Panics
///
/// Panics if the builder rejects the definition.
pub fn test_pipeline(stages: impl IntoIterator<Item = TestStage>) -> TestPipeline {
    match test_pipeline_builder(stages).build() {
        Ok(pipeline) => pipeline,
        Err(err) => panic!("counter pipeline is always valid: {err}"),
    }
}

/// The four stages that produce a complete result.
pub fn successful_stages() -> Vec<TestStage> {
    vec![
        Stage::from_fn(addition_stage),
        Stage::from_fn(addition_stage),
        Stage::from_fn(return_sum_result),
        Stage::from_fn(return_history_result),
    ]
}
