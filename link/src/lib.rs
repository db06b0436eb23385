//! # dbq-link: Typed Query Materialization
//!
//! Runs SQL against any driver that implements the [`Queryer`] /
//! [`Executor`] seam and turns the returned cursor into typed values.
//!
//! ## Features
//!
//! - **Column Decoding**: Driver type names map to typed values; NOT NULL
//!   columns are never wrapped as optional
//! - **Record Binding**: Rows bind into caller types by column tag, with an
//!   optional fast-scan path and per-record post-processing hooks
//! - **Retries**: Exponential backoff for transient failures, bounded by a
//!   [`CancellationToken`](tokio_util::sync::CancellationToken)
//! - **Argument Flattening**: List arguments expand in place
//! - **Bulk Update**: One `UPDATE ... CASE` statement for many rows
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dbq_link::{args, query, QueryOptions, RetryPolicy};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(db: &dyn dbq_link::Queryer) -> dbq_link::Result<()> {
//! let ctx = CancellationToken::new();
//! let opts = QueryOptions::new().with_retry_policy(RetryPolicy::fast());
//!
//! let rows = query(&ctx, db, "SELECT id, name FROM users WHERE id IN (?, ?, ?)", &opts, args![vec![1i64, 2, 3]])
//!     .await?
//!     .into_rows()
//!     .unwrap_or_default();
//! for row in rows {
//!     println!("{:?}", row.get("name"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod binder;
pub mod bulk_update;
pub mod decode;
pub mod driver;
pub mod error;
pub mod models;
pub mod placeholders;
mod post_process;
pub mod query;
mod retry;

// Re-export main types for convenience
pub use binder::{Capabilities, Field, FromDecoded, Record, ScanSlot};
pub use bulk_update::{build_bulk_update, bulk_update, BulkStatement};
pub use decode::{classify, decode_cell, ColumnDecoder, ColumnKind};
pub use driver::{DriverError, Executor, Queryer, RowCursor};
pub use error::{BoxError, LinkError, Result};
pub use models::{
    flatten_args, Arg, BulkUpdateOptions, ColumnDescriptor, DecodeHook, DecodedValue,
    DecoderConfig, Dialect, ExecResult, IntoParam, Nullability, Param, PostFetch, QueryOptions,
    QueryOutput, RawCell, RetryPolicy, Row, ScanKind, Value,
};
pub use placeholders::{insert_stmt, placeholders};
pub use query::{execute, query};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build a `Vec<Arg>` from heterogeneous positional arguments.
///
/// `Vec`s of scalars become list arguments and are flattened in place at
/// execution time.
///
/// ```
/// use dbq_link::{args, flatten_args, Value};
///
/// let flat = flatten_args(args![1i64, vec![2i64, 3], 4i64]);
/// assert_eq!(flat, vec![Some(Value::I64(1)), Some(Value::I64(2)), Some(Value::I64(3)), Some(Value::I64(4))]);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($arg)),+]
    };
}

/// Build a `Vec<Param>` row, e.g. for [`bulk_update`] data.
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Param>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::IntoParam::into_param($value)),+]
    };
}
