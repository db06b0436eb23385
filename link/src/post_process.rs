//! Post-processing of bound records.
//!
//! Runs [`Record::post_process`] for every record once all rows have been
//! materialized. Either sequentially in row order, or fanned out over a
//! [`JoinSet`] bounded by a semaphore. In both modes the first error fails
//! the whole call and no records are returned.

use futures_util::FutureExt;
use log::{debug, warn};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::binder::Record;
use crate::error::{BoxError, LinkError, Result};

/// Logical processors available to this process (at least 1).
pub(crate) fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Run post-processing hooks over `records`.
///
/// Concurrent mode is only used when requested, when there is more than one
/// record, and when more than one logical processor is available.
pub(crate) async fn run<T: Record>(
    ctx: &CancellationToken,
    records: Vec<T>,
    concurrent: bool,
    max_concurrency: Option<usize>,
) -> Result<Vec<T>> {
    let parallelism = available_parallelism();
    if concurrent && parallelism > 1 && records.len() > 1 {
        let limit = max_concurrency.unwrap_or(parallelism).max(1);
        run_concurrent(ctx, records, limit).await
    } else {
        run_sequential(ctx, records).await
    }
}

fn annotate(ctx: &CancellationToken, index: usize, count: usize, source: BoxError) -> LinkError {
    if ctx.is_cancelled() && is_cancellation(&source) {
        return LinkError::Cancelled;
    }
    LinkError::PostProcessError {
        index,
        count,
        source,
    }
}

fn is_cancellation(err: &BoxError) -> bool {
    matches!(err.downcast_ref::<LinkError>(), Some(LinkError::Cancelled))
}

async fn run_sequential<T: Record>(ctx: &CancellationToken, mut records: Vec<T>) -> Result<Vec<T>> {
    let count = records.len();
    debug!("[DBQ_POST] Running {} hooks sequentially", count);

    for (index, record) in records.iter_mut().enumerate() {
        if ctx.is_cancelled() {
            return Err(LinkError::Cancelled);
        }
        if let Err(source) = record.post_process(ctx, index, count).await {
            warn!("[DBQ_POST] Hook failed at row {} of {}: {}", index, count, source);
            return Err(annotate(ctx, index, count, source));
        }
    }
    Ok(records)
}

async fn run_concurrent<T: Record>(
    ctx: &CancellationToken,
    records: Vec<T>,
    limit: usize,
) -> Result<Vec<T>> {
    let count = records.len();
    debug!("[DBQ_POST] Running {} hooks concurrently (limit {})", count, limit);

    // Child token: cancelling it on failure must not cancel the caller's token.
    let token = ctx.child_token();
    let semaphore = Arc::new(Semaphore::new(limit));
    let mut join_set = JoinSet::new();

    for (index, mut record) in records.into_iter().enumerate() {
        let token = token.clone();
        let semaphore = Arc::clone(&semaphore);
        join_set.spawn(async move {
            let outcome: std::result::Result<(), BoxError> = tokio::select! {
                biased;
                _ = token.cancelled() => Err(Box::new(LinkError::Cancelled) as BoxError),
                permit = semaphore.acquire_owned() => match permit {
                    Ok(_permit) => {
                        let hook = AssertUnwindSafe(record.post_process(&token, index, count)).catch_unwind();
                        tokio::select! {
                            biased;
                            _ = token.cancelled() => Err(Box::new(LinkError::Cancelled) as BoxError),
                            result = hook => match result {
                                Ok(result) => result,
                                Err(_) => Err(BoxError::from("post-process hook panicked")),
                            },
                        }
                    },
                    Err(e) => Err(Box::new(e) as BoxError),
                },
            };
            (index, record, outcome)
        });
    }

    let mut slots: Vec<Option<T>> = (0..count).map(|_| None).collect();
    let mut first_error: Option<LinkError> = None;

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, record, Ok(()))) => slots[index] = Some(record),
            Ok((index, _, Err(source))) => {
                if first_error.is_none() {
                    warn!("[DBQ_POST] Hook failed at row {} of {}: {}", index, count, source);
                    token.cancel();
                    first_error = Some(annotate(ctx, index, count, source));
                }
            },
            Err(join_err) => {
                if first_error.is_none() {
                    token.cancel();
                    first_error = Some(LinkError::InternalError(format!(
                        "post-process task failed: {}",
                        join_err
                    )));
                }
            },
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }

    slots
        .into_iter()
        .collect::<Option<Vec<T>>>()
        .ok_or_else(|| LinkError::InternalError("post-process lost a record".to_string()))
}
