//! The provider contract every backing store must satisfy bit-for-bit.
//!
//! A provider never serves a non-batch API: every operation is parameterized
//! by a user id list and returns a [`Response`] with one entry per user. The
//! `Activity` handle (in `feed-client`) is what adapts this to a single-user
//! scalar call.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::event::Event;
use crate::ids::UserId;
use crate::response::Response;

/// Arguments to `paginate`, bundled so call sites don't juggle four params.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    /// 1-indexed page number.
    pub page: u32,
    pub per_page: u32,
    /// If true, do not advance `last_read`.
    pub peek: bool,
    /// If true, also compute `total_count` for the response.
    pub with_total: bool,
}

/// Result of a `paginate` or `fetch` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Events ordered by `at` descending, windowed to the requested page.
    pub events: Vec<Event>,
    /// Present only when the request asked for it (`with_total = true`).
    pub total: Option<u64>,
}

/// A predicate for `delete_if`, invoked once per `(user_id, event)` pair.
pub type DeletePredicate = Arc<dyn Fn(&UserId, &Event) -> bool + Send + Sync>;

/// The backing-store contract. Implementations: `feed-memory`'s in-process
/// reference store and `feed-remote`'s sorted-set store.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn store(&self, cfg: &FeedConfig, users: &[UserId], event: Event) -> Response<bool>;

    async fn delete(&self, cfg: &FeedConfig, users: &[UserId], event: Event) -> Response<bool>;

    async fn delete_if(
        &self,
        cfg: &FeedConfig,
        users: &[UserId],
        pred: DeletePredicate,
    ) -> Response<usize>;

    async fn wipe(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<bool>;

    async fn paginate(&self, cfg: &FeedConfig, users: &[UserId], req: PageRequest) -> Response<Page>;

    async fn fetch(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<Vec<Event>>;

    async fn reset_last_read(
        &self,
        cfg: &FeedConfig,
        users: &[UserId],
        at: Option<f64>,
    ) -> Response<f64>;

    async fn total_count(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<u64>;

    async fn unread_count(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<u64>;

    async fn last_read(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<f64>;
}

/// Validate a page request the way every provider must before doing any work.
pub fn validate_page_request(req: PageRequest) -> Result<(), FeedError> {
    if req.page < 1 {
        return Err(FeedError::argument("page must be >= 1"));
    }
    if req.per_page < 1 {
        return Err(FeedError::argument("per_page must be >= 1"));
    }
    Ok(())
}
