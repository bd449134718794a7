//! Error types for stagewise pipelines.
//!
//! Building a pipeline can fail with a [`PipelineValidationError`]. Running
//! one fails with an [`ExecutionError`]: either a [`PipelineError`] (the
//! invocation failed and every rollback hook that ran succeeded) or a
//! [`PipelineRollbackError`] (a rollback hook failed as well).

use crate::core::{PartialResults, PipelineMetadata};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Metadata about a configuration error for better diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "PIPELINE-002-INITIALIZER").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }
}

/// Error raised when a pipeline definition is incomplete.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// Optional contract error info.
    pub error_info: Option<ContractErrorInfo>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_info: None,
        }
    }

    /// Sets the contract error info.
    #[must_use]
    pub fn with_error_info(mut self, info: ContractErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// The pipeline name is empty.
    #[must_use]
    pub fn missing_name() -> Self {
        Self::new("Pipeline name must not be empty").with_error_info(
            ContractErrorInfo::new("PIPELINE-001-NAME", "Empty pipeline name")
                .with_fix_hint("Pass a non-empty name; it prefixes every error message"),
        )
    }

    /// No initializer was configured.
    #[must_use]
    pub fn missing_initializer(pipeline: &str) -> Self {
        Self::new(format!("Pipeline '{pipeline}' has no initializer")).with_error_info(
            ContractErrorInfo::new("PIPELINE-002-INITIALIZER", "Missing context initializer")
                .with_fix_hint("Call initializer() or async_initializer() on the builder"),
        )
    }

    /// No results validator was configured.
    #[must_use]
    pub fn missing_validator(pipeline: &str) -> Self {
        Self::new(format!("Pipeline '{pipeline}' has no results validator")).with_error_info(
            ContractErrorInfo::new("PIPELINE-003-VALIDATOR", "Missing results validator")
                .with_fix_hint("Call results_validator() on the builder"),
        )
    }

    /// Returns the error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }
}

/// The accumulated results were not a complete, well-typed result.
#[derive(Debug, Error)]
pub enum ResultsValidationError {
    /// The results validator returned false.
    #[error("Results from pipeline failed validation")]
    Rejected,
    /// The validator accepted the results but they do not deserialize into
    /// the result type.
    #[error("Results from pipeline failed validation: {0}")]
    Shape(#[source] serde_json::Error),
}

/// A rollback hook failed while unwinding an invocation.
#[derive(Debug, Error)]
#[error("Rollback failed for stage: {stage}")]
pub struct StageRollbackError {
    /// Stage whose rollback hook failed.
    pub stage: String,
    /// Stages rolled back successfully before the failure, in rollback order.
    pub rolled_back: Vec<String>,
    /// Stages with a rollback hook that were not invoked because of the failure.
    pub skipped: Vec<String>,
    /// Error returned by the hook.
    #[source]
    pub cause: anyhow::Error,
}

/// Snapshot of an invocation at the moment it failed.
#[derive(Debug)]
pub struct PipelineData<A, C> {
    /// The context, or `None` if the initializer failed.
    pub context: Option<C>,
    /// Results merged before the failure.
    pub results: PartialResults,
    /// The invocation's metadata.
    pub metadata: PipelineMetadata<A>,
}

/// The invocation failed; every rollback hook that ran succeeded.
#[derive(Debug)]
pub struct PipelineError<A, C> {
    message: String,
    data: PipelineData<A, C>,
    cause: anyhow::Error,
}

impl<A, C> PipelineError<A, C> {
    /// Creates a pipeline error, prefixing the message with the pipeline name.
    #[must_use]
    pub fn new(data: PipelineData<A, C>, cause: anyhow::Error) -> Self {
        let message = format!("[{}] {:#}", data.metadata.name(), cause);
        Self {
            message,
            data,
            cause,
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the snapshot taken when the invocation failed.
    #[must_use]
    pub fn pipeline_data(&self) -> &PipelineData<A, C> {
        &self.data
    }

    /// Consumes the error and returns the snapshot.
    #[must_use]
    pub fn into_pipeline_data(self) -> PipelineData<A, C> {
        self.data
    }

    /// Returns the error that failed the invocation.
    #[must_use]
    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }
}

impl<A, C> fmt::Display for PipelineError<A, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl<A: fmt::Debug, C: fmt::Debug> std::error::Error for PipelineError<A, C> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.cause)
    }
}

/// The invocation failed and a rollback hook failed while unwinding it.
#[derive(Debug)]
pub struct PipelineRollbackError<A, C> {
    message: String,
    original: Box<PipelineError<A, C>>,
    rollback: StageRollbackError,
}

impl<A, C> PipelineRollbackError<A, C> {
    /// Wraps the error that triggered the rollback and the hook failure.
    #[must_use]
    pub fn new(original: PipelineError<A, C>, rollback: StageRollbackError) -> Self {
        let message = format!(
            "[{}] {}",
            original.pipeline_data().metadata.name(),
            rollback
        );
        Self {
            message,
            original: Box::new(original),
            rollback,
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the stage whose rollback hook failed.
    #[must_use]
    pub fn stage(&self) -> &str {
        &self.rollback.stage
    }

    /// Returns the stages rolled back before the failure.
    #[must_use]
    pub fn rolled_back(&self) -> &[String] {
        &self.rollback.rolled_back
    }

    /// Returns the stages never rolled back because of the failure.
    #[must_use]
    pub fn skipped(&self) -> &[String] {
        &self.rollback.skipped
    }

    /// Returns the error returned by the rollback hook.
    #[must_use]
    pub fn cause(&self) -> &anyhow::Error {
        &self.rollback.cause
    }

    /// Returns the error that triggered the rollback.
    #[must_use]
    pub fn original_pipeline_error(&self) -> &PipelineError<A, C> {
        &self.original
    }

    /// Returns the snapshot taken when the invocation failed.
    #[must_use]
    pub fn pipeline_data(&self) -> &PipelineData<A, C> {
        self.original.pipeline_data()
    }

    /// Consumes the error and returns its parts.
    #[must_use]
    pub fn into_parts(self) -> (PipelineError<A, C>, StageRollbackError) {
        (*self.original, self.rollback)
    }
}

impl<A, C> fmt::Display for PipelineRollbackError<A, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl<A: fmt::Debug, C: fmt::Debug> std::error::Error for PipelineRollbackError<A, C> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.rollback)
    }
}

/// Error returned by a pipeline invocation.
#[derive(Debug)]
pub enum ExecutionError<A, C> {
    /// The invocation failed and was rolled back.
    Pipeline(PipelineError<A, C>),
    /// The invocation failed and its rollback failed too.
    Rollback(PipelineRollbackError<A, C>),
}

impl<A, C> ExecutionError<A, C> {
    /// Returns true if a rollback hook failed.
    #[must_use]
    pub const fn is_rollback_failure(&self) -> bool {
        matches!(self, Self::Rollback(_))
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Pipeline(err) => err.message(),
            Self::Rollback(err) => err.message(),
        }
    }

    /// Returns the error that triggered the rollback.
    #[must_use]
    pub fn original_pipeline_error(&self) -> &PipelineError<A, C> {
        match self {
            Self::Pipeline(err) => err,
            Self::Rollback(err) => err.original_pipeline_error(),
        }
    }

    /// Returns the error's cause: the failure itself, or the rollback
    /// hook's error for rollback failures.
    #[must_use]
    pub fn cause(&self) -> &anyhow::Error {
        match self {
            Self::Pipeline(err) => err.cause(),
            Self::Rollback(err) => err.cause(),
        }
    }

    /// Returns the snapshot taken when the invocation failed.
    #[must_use]
    pub fn pipeline_data(&self) -> &PipelineData<A, C> {
        self.original_pipeline_error().pipeline_data()
    }
}

impl<A, C> From<PipelineError<A, C>> for ExecutionError<A, C> {
    fn from(err: PipelineError<A, C>) -> Self {
        Self::Pipeline(err)
    }
}

impl<A, C> From<PipelineRollbackError<A, C>> for ExecutionError<A, C> {
    fn from(err: PipelineRollbackError<A, C>) -> Self {
        Self::Rollback(err)
    }
}

impl<A, C> fmt::Display for ExecutionError<A, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl<A: fmt::Debug, C: fmt::Debug> std::error::Error for ExecutionError<A, C> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pipeline(err) => std::error::Error::source(err),
            Self::Rollback(err) => std::error::Error::source(err),
        }
    }
}
