//! Core domain model types for stagewise.
//!
//! This module contains the values threaded through every invocation:
//! - Pipeline metadata (name, arguments, run ID)
//! - Partial results and the deep merge that accumulates them

mod metadata;
mod results;

pub use metadata::PipelineMetadata;
pub use results::{deep_merge, merge_partial, PartialResultError, PartialResults, StageResult};
