//! # Stagewise
//!
//! Staged pipeline execution with middleware and compensating rollback.
//!
//! A pipeline runs an ordered list of stages against a context produced
//! once per invocation, with support for:
//!
//! - **Sequential stages**: bare stage functions or configurations carrying
//!   an explicit name and a rollback hook
//! - **Onion middleware**: cross-cutting layers around every stage call,
//!   first-registered outermost
//! - **Result accumulation**: partial results deep-merged into one object,
//!   validated and deserialized into the result type
//! - **Rollback**: stages that began executing are compensated in reverse
//!   order when anything fails, stopping at the first failing hook
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stagewise::prelude::*;
//!
//! let pipeline = PipelineBuilder::<Args, Ctx, Output>::new("checkout")
//!     .initializer(|args| Ok(Ctx::new(args)))
//!     .stage_fn(reserve_stock)
//!     .stage(StageConfiguration::from_fn(charge_card).with_rollback_fn(refund))
//!     .stage_fn(write_receipt)
//!     .middleware(TimingMiddleware::default())
//!     .results_validator(|results| results.contains_key("receipt"))
//!     .build()?;
//!
//! let output = pipeline.run(args).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod core;
pub mod errors;
pub mod interceptors;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{PartialResults, PipelineMetadata, StageResult};
    pub use crate::errors::{
        ContractErrorInfo, ExecutionError, PipelineData, PipelineError,
        PipelineRollbackError, PipelineValidationError, ResultsValidationError,
        StageRollbackError,
    };
    pub use crate::interceptors::{
        HookMiddleware, LogStageMiddleware, Middleware, MiddlewarePayload, Next,
        StageHooks, TimingMiddleware,
    };
    pub use crate::observability::{LogFn, TracingConfig};
    pub use crate::pipeline::{
        build_pipeline, Initializer, Pipeline, PipelineBuilder, PipelineConfig,
    };
    pub use crate::stages::{RollbackHandler, Stage, StageConfiguration, StageHandler};
}
