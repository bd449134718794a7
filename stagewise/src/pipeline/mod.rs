//! Pipeline building and execution.
//!
//! This module provides:
//! - Context initializers
//! - The pipeline configuration and a validating builder
//! - The sequential executor
//! - Rollback of already-started stages

mod builder;
mod executor;
mod initializer;
mod rollback;


pub use builder::{build_pipeline, PipelineBuilder, PipelineConfig};
pub use executor::{Pipeline, ResultsValidator};
pub use initializer::{AsyncFnInitializer, FnInitializer, Initializer};
pub use rollback::ProcessedStages;
