//! Waits for query jobs to reach a terminal status.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::backoff::ExponentialBackoff;
use crate::error::{ErrorKind, SlResult};
use crate::models::{QueryId, QueryResult};
use crate::runtime::Runtime;
use crate::sl_error;

/// Probes the status of `query_id` until it is terminal or `budget` is spent.
///
/// Between probes the poller sleeps for the next interval of `backoff`, cut short at the end of
/// `budget`. Once the time elapsed since the first probe reaches `budget`, it fails with [`ErrorKind::RetryTimeout`] carrying the
/// last observed status. Probe failures are returned as they are, without retrying.
pub async fn poll_until_complete<R, P, F>(
    runtime: &R,
    query_id: &QueryId,
    backoff: &ExponentialBackoff,
    budget: Duration,
    mut probe: P,
) -> SlResult<QueryResult>
where
    R: Runtime,
    P: FnMut() -> F,
    F: Future<Output = SlResult<QueryResult>>,
{
    let started = runtime.now();
    let mut intervals = backoff.iter();
    let mut attempts: u32 = 0;

    loop {
        let result = probe().await?;
        attempts = attempts.saturating_add(1);

        if result.status.is_terminal() {
            info!(
                %query_id,
                status = %result.status,
                attempts,
                "query reached a terminal status"
            );

            return Ok(result);
        }

        // The wait never reaches past the end of the budget.
        let remaining = budget.saturating_sub(runtime.now().saturating_duration_since(started));
        let interval = intervals
            .next()
            .unwrap_or(backoff.max_interval())
            .min(remaining);
        debug!(
            %query_id,
            status = %result.status,
            attempts,
            wait_ms = interval.as_millis() as u64,
            "query still running, waiting before the next poll"
        );
        runtime.sleep(interval).await;

        let elapsed = runtime.now().saturating_duration_since(started);
        if elapsed >= budget {
            warn!(
                %query_id,
                last_status = %result.status,
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = budget.as_millis() as u64,
                "query did not complete within the timeout budget"
            );

            return Err(sl_error!(
                ErrorKind::RetryTimeout,
                "Query did not complete within the timeout budget",
                format!("gave up after {attempts} polls")
            )
            .with_query_id(query_id.clone())
            .with_last_status(result.status)
            .with_timeout(budget)
            .with_elapsed(elapsed));
        }
    }
}
