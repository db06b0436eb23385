//! Data models for dbq-link.
//!
//! Column metadata, decoded values, bound arguments, and the configuration
//! structures consumed by the query and bulk-update entry points.

pub mod bulk_update_options;
pub mod column_descriptor;
pub mod decoded_value;
pub mod decoder_config;
pub mod dialect;
pub mod exec_result;
pub mod param;
pub mod query_options;
pub mod query_output;
pub mod raw_cell;
pub mod retry_policy;
pub mod row;
pub mod value;

#[cfg(test)]
mod tests;

pub use bulk_update_options::BulkUpdateOptions;
pub use column_descriptor::{ColumnDescriptor, Nullability, ScanKind};
pub use decoded_value::DecodedValue;
pub use decoder_config::DecoderConfig;
pub use dialect::Dialect;
pub use exec_result::ExecResult;
pub use param::{flatten_args, Arg, IntoParam, Param};
pub use query_options::{DecodeHook, PostFetch, QueryOptions};
pub use query_output::QueryOutput;
pub use raw_cell::RawCell;
pub use retry_policy::RetryPolicy;
pub use row::Row;
pub use value::Value;
