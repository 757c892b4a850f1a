use std::future::Future;
use std::time::Duration;
use topic_admin::{AdminError, Operation};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

/// Re-issues `call` with exponential backoff while it fails with a retryable
/// error. Domain errors are returned on the first attempt.
pub async fn with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation: Operation,
    mut call: F,
) -> Result<T, AdminError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AdminError>>,
{
    let mut delay = policy.initial_delay;
    let mut attempt = 1;
    loop {
        match call().await {
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                warn!(
                    "Attempt {}/{} to {} failed: {}. Retrying in {:?}",
                    attempt, policy.max_attempts, operation, e, delay
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2).min(policy.max_delay);
                attempt += 1;
            }
            result => return result,
        }
    }
}
