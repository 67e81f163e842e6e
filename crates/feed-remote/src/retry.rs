//! Bounded retry for idempotent read operations only: `fetch`, peeking
//! `paginate`, `total_count`, `unread_count`, and `last_read`. Mutating
//! operations never go through this.
//!
//! No backoff crate is introduced; this is the same plain bounded-attempts
//! loop shape the workspace already uses for job retries, just without the
//! persistence around it.

use std::future::Future;
use std::time::Duration;

use feed_core::FeedError;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(20);

pub async fn retry_idempotent<T, F, Fut>(mut op: F) -> Result<T, FeedError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FeedError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt + 1 < MAX_ATTEMPTS => {
                attempt += 1;
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(err) => return Err(err),
        }
    }
}
