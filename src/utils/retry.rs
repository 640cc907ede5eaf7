use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, backoff: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

/// Runs `call` until it succeeds, returns an error that `should_retry`
/// rejects, or `policy.max_attempts` attempts have been made. `call`
/// receives the 1-based attempt number. The last error is returned as-is.
pub async fn retry_with<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    operation: &str,
    should_retry: P,
    mut call: F,
) -> Result<T, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0usize;
    loop {
        attempt += 1;
        match call(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let retrying = attempt < max_attempts && should_retry(&err);
                warn!(
                    "{} attempt {}/{} failed: {} (retrying={})",
                    operation, attempt, max_attempts, err, retrying
                );
                if !retrying {
                    return Err(err);
                }
                if !policy.backoff.is_zero() {
                    tokio::time::sleep(policy.backoff).await;
                }
            }
        }
    }
}
