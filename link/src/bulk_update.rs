//! Multi-row UPDATE synthesis.
//!
//! Builds a single `UPDATE ... SET col = CASE WHEN pk = ? THEN ? ... END`
//! statement that updates many rows at once, keyed by primary key.

use log::debug;
use std::collections::HashMap;
use std::hash::Hash;
use tokio_util::sync::CancellationToken;

use crate::driver::Executor;
use crate::error::{LinkError, Result};
use crate::models::{Arg, BulkUpdateOptions, ExecResult, Param, Value};
use crate::placeholders::placeholders;
use crate::query::execute;

/// A synthesized statement and its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkStatement {
    pub sql: String,
    pub args: Vec<Param>,
}

/// SQL type used for the `::TYPE` cast on a bound value under PostgreSQL.
fn cast_type(value: &Value) -> &'static str {
    match value {
        Value::I8(_)
        | Value::I16(_)
        | Value::I32(_)
        | Value::I64(_)
        | Value::U8(_)
        | Value::U16(_)
        | Value::U32(_)
        | Value::U64(_) => "INT",
        Value::Text(_) => "VARCHAR",
        Value::Float(_) => "NUMERIC",
        Value::Bool(_) => "BOOLEAN",
        Value::Timestamp(_) => "TIMESTAMP",
        Value::Date(_) => "DATE",
        Value::Time(_) => "TIME",
        Value::Json(_) | Value::Bytes(_) => "TEXT",
    }
}

fn validate(opts: &BulkUpdateOptions) -> Result<()> {
    if opts.table.trim().is_empty() || opts.columns.is_empty() {
        return Err(LinkError::configuration("no table name or column name(s) provided"));
    }
    if opts.primary_key.trim().is_empty() {
        return Err(LinkError::configuration(
            "primary key column in database table needs to be specified",
        ));
    }
    Ok(())
}

/// Build the UPDATE statement for `data` without executing it.
///
/// `data` maps each primary key value to the new values for
/// `opts.columns`, in the same order. `None` sets the column to NULL.
/// Returns `Ok(None)` when `data` is empty.
pub fn build_bulk_update<K>(
    data: &HashMap<K, Vec<Param>>,
    opts: &BulkUpdateOptions,
) -> Result<Option<BulkStatement>>
where
    K: Eq + Hash + Clone + Into<Value>,
{
    validate(opts)?;
    if data.is_empty() {
        return Ok(None);
    }

    // Captured once: every CASE block and the IN list must agree on key order.
    let entries: Vec<(Value, &Vec<Param>)> = data
        .iter()
        .map(|(key, values)| (key.clone().into(), values))
        .collect();

    for (key, values) in &entries {
        if values.len() != opts.columns.len() {
            return Err(LinkError::configuration(format!(
                "update data for key {:?} has {} values but {} columns were given",
                key,
                values.len(),
                opts.columns.len()
            )));
        }
    }

    let dialect = opts.dialect;
    let pk = &opts.primary_key;
    let mut args: Vec<Param> = Vec::with_capacity(entries.len() * (opts.columns.len() * 2 + 1));
    let mut position = 0usize;
    let mut next_placeholder = || {
        position += 1;
        dialect.placeholder(position)
    };

    let mut sets = Vec::with_capacity(opts.columns.len());
    for (col_idx, column) in opts.columns.iter().enumerate() {
        let mut set = format!("{} = CASE\n", column);
        for (key, values) in &entries {
            let key_ph = next_placeholder();
            match &values[col_idx] {
                None => {
                    set.push_str(&format!("\tWHEN {} = {} THEN NULL\n", pk, key_ph));
                    args.push(Some(key.clone()));
                },
                Some(value) => {
                    let value_ph = next_placeholder();
                    if dialect.requires_casts() {
                        set.push_str(&format!(
                            "\tWHEN {} = {} THEN {}::{}\n",
                            pk,
                            key_ph,
                            value_ph,
                            cast_type(value)
                        ));
                    } else {
                        set.push_str(&format!("\tWHEN {} = {} THEN {}\n", pk, key_ph, value_ph));
                    }
                    args.push(Some(key.clone()));
                    args.push(Some(value.clone()));
                },
            }
        }
        set.push_str("END");
        sets.push(set);
    }

    let where_in = placeholders(entries.len(), 1, position, dialect);
    let mut sql = format!(
        "UPDATE {} SET\n {}\nWHERE {} IN {}",
        opts.table,
        sets.join(",\n "),
        pk,
        where_in
    );
    if let Some(suffix) = opts.stmt_suffix.as_deref().filter(|s| !s.is_empty()) {
        sql.push(' ');
        sql.push_str(suffix);
    }

    args.extend(entries.into_iter().map(|(key, _)| Some(key)));

    Ok(Some(BulkStatement { sql, args }))
}

/// Update many rows with a single statement.
///
/// An empty `data` map returns [`ExecResult::default()`] without touching
/// the database. The statement runs once, without retries.
///
/// # Example
///
/// ```rust,no_run
/// # async fn example(db: &dyn dbq_link::Executor) -> dbq_link::Result<()> {
/// use std::collections::HashMap;
/// use dbq_link::{bulk_update, params, BulkUpdateOptions};
/// use tokio_util::sync::CancellationToken;
///
/// let opts = BulkUpdateOptions::new("users", "id").with_columns(["name", "age"]);
/// let mut data = HashMap::new();
/// data.insert(1i64, params!["rabbit", 5i64]);
/// data.insert(2i64, params!["cat", 8i64]);
///
/// let result = bulk_update(&CancellationToken::new(), db, &data, &opts).await?;
/// # Ok(())
/// # }
/// ```
pub async fn bulk_update<K, E>(
    ctx: &CancellationToken,
    db: &E,
    data: &HashMap<K, Vec<Param>>,
    opts: &BulkUpdateOptions,
) -> Result<ExecResult>
where
    K: Eq + Hash + Clone + Into<Value>,
    E: Executor + ?Sized,
{
    let Some(stmt) = build_bulk_update(data, opts)? else {
        debug!("[DBQ_BULK] No update data for table {}, skipping", opts.table);
        return Ok(ExecResult::default());
    };

    debug!(
        "[DBQ_BULK] Updating {} rows x {} columns in {} (dialect={:?}, args={})",
        data.len(),
        opts.columns.len(),
        opts.table,
        opts.dialect,
        stmt.args.len()
    );

    let args = stmt.args.into_iter().map(Arg::Param).collect();
    execute(ctx, db, &stmt.sql, None, args).await
}
