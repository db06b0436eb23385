//! Transport seam between dbq-link and an underlying SQL driver.
//!
//! A driver only needs to issue the round trip and hand back a forward-only
//! cursor with per-column metadata. Everything above that (decoding,
//! binding, retries, post-processing) lives in this crate.

use crate::error::BoxError;
use crate::models::{ColumnDescriptor, ExecResult, Param, RawCell};
use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a driver for a single round trip.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The transaction the statement ran in was already committed or rolled back.
    #[error("transaction has already been committed or rolled back")]
    TxDone,

    /// The connection was already returned to its pool or closed.
    #[error("connection is already closed")]
    ConnDone,

    /// The statement's placeholders do not match the bound arguments.
    #[error("expected {expected} arguments, got {got}")]
    ArgumentCount { expected: usize, got: usize },

    /// Network or server-side failure.
    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Other(BoxError),
}

impl DriverError {
    /// Permanent failures are never retried, whatever budget remains.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            DriverError::TxDone | DriverError::ConnDone | DriverError::ArgumentCount { .. }
        )
    }
}

/// Forward-only row cursor produced by [`Queryer::query`].
///
/// Every row holds exactly one [`RawCell`] per entry of [`RowCursor::columns`],
/// in the same order.
#[async_trait]
pub trait RowCursor: Send {
    /// Column metadata, fixed for the lifetime of the cursor.
    fn columns(&self) -> &[ColumnDescriptor];

    /// Fetch the next row, or `None` once the cursor is drained.
    async fn next_row(&mut self) -> Result<Option<Vec<RawCell>>, DriverError>;
}

/// Read path: anything that can run a query and return a cursor.
#[async_trait]
pub trait Queryer: Send + Sync {
    async fn query(&self, sql: &str, params: &[Param]) -> Result<Box<dyn RowCursor>, DriverError>;
}

/// Write path: anything that can run a statement and report affected rows.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, sql: &str, params: &[Param]) -> Result<ExecResult, DriverError>;
}
