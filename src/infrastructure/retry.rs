//! Generic async retry with exponential backoff
//!
//! Only errors the caller classifies as retriable are retried; the
//! attempt count is reported either way so callers can surface it.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Exponential backoff policy: base, 2*base, 4*base, ...
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max_retries: u32,
}

impl BackoffPolicy {
    /// Delay before the retry following the given (1-based) failed attempt
    pub fn delay_after(&self, attempt: u32) -> Duration {
        // Cap the shift so a misconfigured retry count cannot overflow
        self.base * (1u32 << (attempt - 1).min(16))
    }
}

/// Run an async operation with retries.
///
/// Returns the value and the number of attempts on success, or the
/// attempt count paired with the final error once retries are
/// exhausted or a non-retriable error occurs.
pub async fn retry_async<F, Fut, T, E>(
    mut op: F,
    policy: &BackoffPolicy,
    is_retriable: impl Fn(&E) -> bool,
) -> Result<(T, u32), (u32, E)>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match op().await {
            Ok(value) => return Ok((value, attempts)),
            Err(e) if attempts <= policy.max_retries && is_retriable(&e) => {
                let delay = policy.delay_after(attempts);
                warn!("Attempt {} failed, retrying in {:?}", attempts, delay);
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err((attempts, e)),
        }
    }
}
