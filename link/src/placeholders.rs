//! Placeholder and INSERT statement generation.

use crate::error::{LinkError, Result};
use crate::models::Dialect;

/// Generate `n_rows` parenthesized groups of `n_cols` placeholders.
///
/// `start` is the number of placeholders already present in the statement,
/// so PostgreSQL numbering continues from `$start+1`. MySQL ignores it.
///
/// ```
/// use dbq_link::{placeholders, Dialect};
///
/// assert_eq!(placeholders(2, 2, 0, Dialect::MySql), "(?,?),(?,?)");
/// assert_eq!(placeholders(2, 2, 3, Dialect::PostgreSql), "($4,$5),($6,$7)");
/// ```
pub fn placeholders(n_cols: usize, n_rows: usize, start: usize, dialect: Dialect) -> String {
    let mut out = String::with_capacity(n_rows * (n_cols * 3 + 3));
    let mut position = start;
    for row in 0..n_rows {
        if row > 0 {
            out.push(',');
        }
        out.push('(');
        for col in 0..n_cols {
            if col > 0 {
                out.push(',');
            }
            position += 1;
            out.push_str(&dialect.placeholder(position));
        }
        out.push(')');
    }
    out
}

/// Build a multi-row `INSERT` statement for `n_rows` rows of `columns`.
///
/// The caller binds `n_rows * columns.len()` arguments in row-major order.
pub fn insert_stmt<S: AsRef<str>>(
    table: &str,
    columns: &[S],
    n_rows: usize,
    dialect: Dialect,
) -> Result<String> {
    if table.trim().is_empty() {
        return Err(LinkError::configuration("no table name provided"));
    }
    if columns.is_empty() {
        return Err(LinkError::configuration("no column names provided"));
    }
    if n_rows == 0 {
        return Err(LinkError::configuration("insert requires at least one row"));
    }

    let column_list = columns
        .iter()
        .map(|c| c.as_ref())
        .collect::<Vec<_>>()
        .join(",");

    Ok(format!(
        "INSERT INTO {} ( {} ) VALUES {}",
        table,
        column_list,
        placeholders(columns.len(), n_rows, 0, dialect)
    ))
}
