use serde::{Deserialize, Serialize};

use super::dialect::Dialect;

/// Configuration for [`crate::bulk_update`].
///
/// # Example
///
/// ```rust
/// use dbq_link::{BulkUpdateOptions, Dialect};
///
/// let opts = BulkUpdateOptions::new("users", "id")
///     .with_columns(["name", "age"])
///     .with_dialect(Dialect::PostgreSql);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpdateOptions {
    /// Table to update
    pub table: String,

    /// Columns to update, in statement order
    #[serde(default)]
    pub columns: Vec<String>,

    /// Column used to select rows
    pub primary_key: String,

    /// Appended verbatim after the WHERE clause (e.g. "RETURNING id")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stmt_suffix: Option<String>,

    /// Default: MySql
    #[serde(default)]
    pub dialect: Dialect,
}

impl BulkUpdateOptions {
    pub fn new(table: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: primary_key.into(),
            ..Self::default()
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_stmt_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.stmt_suffix = Some(suffix.into());
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }
}
