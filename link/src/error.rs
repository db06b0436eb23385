//! Error types for dbq-link.
//!
//! Every public entry point returns [`Result`]. A call either succeeds as a
//! whole or reports exactly one [`LinkError`]; partial result sets are never
//! handed back.

use crate::driver::DriverError;
use thiserror::Error;

/// Boxed error produced by caller-supplied hooks and callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by query materialization and statement synthesis.
#[derive(Error, Debug)]
pub enum LinkError {
    /// Missing or malformed configuration (table, columns, primary key,
    /// record field mapping). Never retried.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A transport failure that was not classified as permanent. Surfaced
    /// after the retry budget is spent, or on the first failure when no
    /// retry policy is configured.
    #[error("Execution error: {0}")]
    ExecutionError(#[source] DriverError),

    /// A failure that must never be retried (finished transaction, closed
    /// connection, placeholder/argument count mismatch).
    #[error("Permanent error: {0}")]
    PermanentError(#[source] DriverError),

    /// A decoded column could not be assigned to its destination field.
    #[error("Binding error on column '{column}': {message}")]
    BindingError { column: String, message: String },

    /// The post-fetch callback aborted the call.
    #[error("Post-fetch callback failed: {0}")]
    PostFetchError(#[source] BoxError),

    /// A record's post-processing hook failed.
    #[error("Post-process failed (row {index} of {count}): {source}")]
    PostProcessError {
        index: usize,
        count: usize,
        #[source]
        source: BoxError,
    },

    /// The caller's cancellation token fired.
    #[error("Operation cancelled")]
    Cancelled,

    /// Unexpected internal state (e.g. a worker task was aborted).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl LinkError {
    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    pub(crate) fn binding(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BindingError {
            column: column.into(),
            message: message.into(),
        }
    }

    /// True when the call ended because the cancellation token fired.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LinkError::Cancelled)
    }
}

/// Result type for dbq-link operations
pub type Result<T> = std::result::Result<T, LinkError>;
