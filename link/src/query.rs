//! Query execution and result materialization.
//!
//! [`query`] runs the read path: flatten arguments, issue the query (with
//! retries when configured), decode or bind every row, run the post-fetch
//! callback, run record post-processing, then collapse to a single item when
//! asked. [`execute`] runs the write path with the same argument handling.

use log::{debug, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::binder::{check_scan_slots, scan_record, Binder, Record};
use crate::decode::ColumnDecoder;
use crate::driver::{Executor, Queryer, RowCursor};
use crate::error::{LinkError, Result};
use crate::models::{
    flatten_args, Arg, ColumnDescriptor, ExecResult, QueryOptions, QueryOutput, RawCell,
    RetryPolicy, Row,
};
use crate::post_process;
use crate::retry::run_with_retry;

fn sql_preview(sql: &str) -> String {
    let flat = sql.replace('\n', " ");
    match flat.char_indices().nth(80) {
        Some((idx, _)) => format!("{}...", &flat[..idx]),
        None => flat,
    }
}

/// Run `sql` and materialize its rows according to `opts`.
///
/// Returns generic rows for `QueryOptions::new()` and bound records for
/// `QueryOptions::<T>::for_records()`. In single-result mode the first item
/// is returned, or [`QueryOutput::Empty`] when nothing matched.
///
/// # Example
///
/// ```rust,no_run
/// # async fn example(db: &dyn dbq_link::Queryer) -> dbq_link::Result<()> {
/// use dbq_link::{args, query, QueryOptions};
/// use tokio_util::sync::CancellationToken;
///
/// let ctx = CancellationToken::new();
/// let rows = query(&ctx, db, "SELECT * FROM users WHERE id IN (?, ?)", &QueryOptions::new(), args![vec![1i64, 2]])
///     .await?
///     .into_rows();
/// # Ok(())
/// # }
/// ```
pub async fn query<T, Q>(
    ctx: &CancellationToken,
    db: &Q,
    sql: &str,
    opts: &QueryOptions<T>,
    args: Vec<Arg>,
) -> Result<QueryOutput<T>>
where
    T: Record,
    Q: Queryer + ?Sized,
{
    let params = flatten_args(args);
    let overall_start = Instant::now();
    debug!(
        "[DBQ_QUERY] Starting query: \"{}\" (len={}, params={})",
        sql_preview(sql),
        sql.len(),
        params.len()
    );

    let mut cursor = run_with_retry(ctx, opts.retry_policy.as_ref(), || db.query(sql, &params)).await?;
    let columns: Arc<[ColumnDescriptor]> = cursor.columns().into();

    let output = if opts.bind_records {
        let mut records = materialize_records(ctx, cursor.as_mut(), &columns, opts).await?;
        run_post_fetch(ctx, opts).await?;

        if T::capabilities().post_process {
            records = post_process::run(
                ctx,
                records,
                opts.concurrent_post_process,
                opts.max_concurrency,
            )
            .await?;
        }

        if opts.single_result {
            records
                .into_iter()
                .next()
                .map_or(QueryOutput::Empty, QueryOutput::Record)
        } else {
            QueryOutput::Records(records)
        }
    } else {
        let rows = materialize_rows(ctx, cursor.as_mut(), &columns, opts.raw_results).await?;
        run_post_fetch(ctx, opts).await?;

        if opts.single_result {
            rows.into_iter().next().map_or(QueryOutput::Empty, QueryOutput::Row)
        } else {
            QueryOutput::Rows(rows)
        }
    };

    debug!(
        "[DBQ_QUERY] Success: items={} total_ms={}",
        output.len(),
        overall_start.elapsed().as_millis()
    );
    Ok(output)
}

/// Run a statement on the write path. No decoding takes place.
pub async fn execute<E>(
    ctx: &CancellationToken,
    db: &E,
    sql: &str,
    retry_policy: Option<&RetryPolicy>,
    args: Vec<Arg>,
) -> Result<ExecResult>
where
    E: Executor + ?Sized,
{
    let params = flatten_args(args);
    let start = Instant::now();
    debug!(
        "[DBQ_QUERY] Executing statement: \"{}\" (len={}, params={})",
        sql_preview(sql),
        sql.len(),
        params.len()
    );

    let result = run_with_retry(ctx, retry_policy, || db.execute(sql, &params)).await?;

    debug!(
        "[DBQ_QUERY] Statement done: rows_affected={} total_ms={}",
        result.rows_affected,
        start.elapsed().as_millis()
    );
    Ok(result)
}

async fn next_row(ctx: &CancellationToken, cursor: &mut dyn RowCursor) -> Result<Option<Vec<RawCell>>> {
    if ctx.is_cancelled() {
        return Err(LinkError::Cancelled);
    }
    cursor.next_row().await.map_err(|err| {
        warn!("[DBQ_QUERY] Cursor failed mid-stream: {}", err);
        if err.is_permanent() {
            LinkError::PermanentError(err)
        } else {
            LinkError::ExecutionError(err)
        }
    })
}

fn check_width(columns: &[ColumnDescriptor], cells: &[RawCell]) -> Result<()> {
    if cells.len() != columns.len() {
        return Err(LinkError::InternalError(format!(
            "cursor returned {} cells for {} columns",
            cells.len(),
            columns.len()
        )));
    }
    Ok(())
}

async fn materialize_rows(
    ctx: &CancellationToken,
    cursor: &mut dyn RowCursor,
    columns: &[ColumnDescriptor],
    raw_results: bool,
) -> Result<Vec<Row>> {
    let decoders: Vec<ColumnDecoder> = columns
        .iter()
        .map(|column| ColumnDecoder::new(column, raw_results))
        .collect();
    let names: Arc<[String]> = columns.iter().map(|column| column.name.clone()).collect();

    let mut rows = Vec::new();
    while let Some(cells) = next_row(ctx, cursor).await? {
        check_width(columns, &cells)?;
        let values = decoders
            .iter()
            .zip(cells)
            .map(|(decoder, cell)| decoder.decode(cell))
            .collect();
        rows.push(Row::new(Arc::clone(&names), values));
    }
    Ok(rows)
}

async fn materialize_records<T: Record>(
    ctx: &CancellationToken,
    cursor: &mut dyn RowCursor,
    columns: &[ColumnDescriptor],
    opts: &QueryOptions<T>,
) -> Result<Vec<T>> {
    let mut records = Vec::new();

    if T::capabilities().fast_scan {
        check_scan_slots::<T>(columns)?;
        while let Some(cells) = next_row(ctx, cursor).await? {
            check_width(columns, &cells)?;
            records.push(scan_record::<T>(columns, cells)?);
        }
        return Ok(records);
    }

    let binder = Binder::<T>::new(
        columns,
        opts.decoder.weakly_typed_input,
        opts.decode_hook.clone(),
    )?;
    let decoders: Vec<ColumnDecoder> = columns
        .iter()
        .map(|column| ColumnDecoder::new(column, opts.raw_results))
        .collect();

    while let Some(cells) = next_row(ctx, cursor).await? {
        check_width(columns, &cells)?;
        records.push(binder.decode_and_bind(columns, &decoders, cells)?);
    }
    Ok(records)
}

async fn run_post_fetch<T: Record>(ctx: &CancellationToken, opts: &QueryOptions<T>) -> Result<()> {
    let Some(callback) = &opts.post_fetch else {
        return Ok(());
    };
    callback(ctx.clone()).await.map_err(|err| {
        warn!("[DBQ_QUERY] Post-fetch callback failed: {}", err);
        LinkError::PostFetchError(err)
    })
}
