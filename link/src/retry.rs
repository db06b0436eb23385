//! Retry loop for a single driver round trip.
//!
//! Permanent driver errors stop immediately. Transient ones are retried on
//! the [`RetryPolicy`] schedule until its budget runs out. The caller's
//! [`CancellationToken`] is passed in explicitly and interrupts both the
//! attempt in flight and any backoff sleep.

use log::{debug, warn};
use std::future::Future;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::driver::DriverError;
use crate::error::{LinkError, Result};
use crate::models::RetryPolicy;

/// Run `op` until it succeeds, fails permanently, exhausts `policy`, or
/// `ctx` is cancelled. Without a policy a single attempt is made.
pub(crate) async fn run_with_retry<T, F, Fut>(
    ctx: &CancellationToken,
    policy: Option<&RetryPolicy>,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, DriverError>>,
{
    let started = Instant::now();
    let mut retries: u32 = 0;

    loop {
        if ctx.is_cancelled() {
            return Err(LinkError::Cancelled);
        }

        let attempt_start = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(LinkError::Cancelled),
            outcome = op() => outcome,
        };

        let err = match outcome {
            Ok(value) => {
                if retries > 0 {
                    debug!(
                        "[DBQ_RETRY] Succeeded after {} retries total_ms={}",
                        retries,
                        started.elapsed().as_millis()
                    );
                }
                return Ok(value);
            },
            Err(err) => err,
        };

        if err.is_permanent() {
            warn!(
                "[DBQ_RETRY] Permanent error (attempt {}): {} duration_ms={}",
                retries + 1,
                err,
                attempt_start.elapsed().as_millis()
            );
            return Err(LinkError::PermanentError(err));
        }

        let Some(policy) = policy else {
            return Err(LinkError::ExecutionError(err));
        };

        if !policy.allows_retry(retries, started.elapsed()) {
            warn!(
                "[DBQ_RETRY] Retry budget exhausted after {} attempts: {} total_ms={}",
                retries + 1,
                err,
                started.elapsed().as_millis()
            );
            return Err(LinkError::ExecutionError(err));
        }

        let delay = policy.delay_for_attempt(retries);
        retries += 1;
        warn!(
            "[DBQ_RETRY] Retriable error (attempt {}): {} retrying in {}ms",
            retries,
            err,
            delay.as_millis()
        );

        tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(LinkError::Cancelled),
            _ = tokio::time::sleep(delay) => {},
        }
    }
}
