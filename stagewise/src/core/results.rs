//! Partial results and the deep merge that accumulates them.

use serde_json::{Map, Value};
use thiserror::Error;

/// The accumulated, not yet validated, results of a pipeline invocation.
pub type PartialResults = Map<String, Value>;

/// What a stage (or a middleware layer) hands back.
///
/// `Ok(None)` and `Ok(Some(Value::Null))` contribute nothing. An object is
/// deep-merged into the accumulated results.
pub type StageResult = anyhow::Result<Option<Value>>;

/// Error raised when a stage returns something that cannot be merged.
#[derive(Debug, Clone, Error)]
#[error("Stage '{stage}' returned a non-object partial result ({kind})")]
pub struct PartialResultError {
    /// The stage that produced the value.
    pub stage: String,
    /// The JSON kind that was returned.
    pub kind: &'static str,
}

/// Merges a stage's partial result into the accumulated results.
///
/// # Errors
///
/// Returns an error if `partial` is neither null nor a JSON object.
pub fn merge_partial(
    results: &mut PartialResults,
    stage: &str,
    partial: Value,
) -> Result<(), PartialResultError> {
    match partial {
        Value::Null => Ok(()),
        Value::Object(fields) => {
            merge_object(results, fields);
            Ok(())
        }
        other => Err(PartialResultError {
            stage: stage.to_string(),
            kind: value_kind(&other),
        }),
    }
}

/// Deep-merges `source` into `target`.
///
/// Objects merge key-wise and arrays index-wise, recursively. Any other
/// combination is replaced by `source`. Keys already in `target` are never
/// removed and arrays never shrink.
pub fn deep_merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => merge_object(target, source),
        (Value::Array(target), Value::Array(source)) => {
            for (index, item) in source.into_iter().enumerate() {
                match target.get_mut(index) {
                    Some(existing) => deep_merge(existing, item),
                    None => target.push(item),
                }
            }
        }
        (slot, source) => *slot = source,
    }
}

fn merge_object(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match target.get_mut(&key) {
            Some(existing) => deep_merge(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
