//! The production `Provider`: a Redis-style sorted-set keyspace, batched
//! with one pipeline per dispatch group and a bounded connection pool.
//!
//! Same "borrow a connection, build the command, map the reply" shape used
//! elsewhere for Redis-backed collaborators: raw `redis::cmd`,
//! `thiserror`-flavored errors via `feed_core::FeedError`, `#[instrument]`
//! on the public methods, aimed at `ZADD`/`ZREVRANGE`/`ZCOUNT`.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use redis::AsyncCommands;
use tracing::instrument;

use feed_core::{
    provider::{validate_page_request, DeletePredicate, Page, PageRequest},
    Event, FeedConfig, FeedError, Provider, Response, UserId,
};

use crate::keyspace::{self, LAST_READ_FIELD};
use crate::pool::ConnectionPool;
use crate::retry::retry_idempotent;

/// Run `op` once per user, dispatching groups of at most `batch_size` users
/// concurrently (one group's connection work never waits on another's).
/// Users within a group run in sequence, same as the pipelined `store`
/// path groups its own work.
async fn dispatch_per_user<T, F, Fut>(
    users: &[UserId],
    batch_size: usize,
    op: F,
) -> Vec<(UserId, Result<T, FeedError>)>
where
    F: Fn(&UserId) -> Fut,
    Fut: Future<Output = Result<T, FeedError>>,
{
    let group_futures = feed_core::batch::partition(users, batch_size).map(|group| async move {
        let mut out = Vec::with_capacity(group.len());
        for user in group {
            out.push((user.clone(), op(user).await));
        }
        out
    });

    join_all(group_futures).await.into_iter().flatten().collect()
}

/// Default deadline for a single connection checkout/command round trip.
const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

fn debug_enabled() -> bool {
    std::env::var("FEED_DEBUG")
        .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"))
        .unwrap_or(false)
}

pub struct RemoteProvider {
    pool: ConnectionPool,
    deadline: Duration,
}

impl RemoteProvider {
    pub fn new(redis_url: impl AsRef<str>, pool_size: usize) -> Result<Self, FeedError> {
        Ok(Self {
            pool: ConnectionPool::new(redis_url, pool_size)?,
            deadline: DEFAULT_DEADLINE,
        })
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    fn keys(&self, cfg: &FeedConfig, user: &UserId) -> (String, String) {
        (
            keyspace::data_key(cfg.namespace(), cfg.name().as_str(), user.as_str()),
            keyspace::meta_key(cfg.namespace(), cfg.name().as_str(), user.as_str()),
        )
    }

    async fn last_read_of(&self, meta_key: String) -> Result<f64, FeedError> {
        let mut conn = self.pool.acquire(self.deadline).await?;
        let raw: Option<String> = conn
            .as_mut()
            .hget(&meta_key, LAST_READ_FIELD)
            .await
            .map_err(|e| FeedError::transport(e.to_string()))?;
        Ok(raw.and_then(|s| s.parse::<f64>().ok()).unwrap_or(0.0))
    }

    /// Read-then-conditionally-write the watermark. Not atomic: a racing
    /// writer can interleave, but the write is a monotonic max, so the
    /// final value is correct regardless of interleaving.
    async fn bump_last_read(&self, meta_key: String, candidate: f64) -> Result<f64, FeedError> {
        let current = self.last_read_of(meta_key.clone()).await?;
        let new_value = current.max(candidate);
        let mut conn = self.pool.acquire(self.deadline).await?;
        let _: () = conn
            .as_mut()
            .hset(&meta_key, LAST_READ_FIELD, new_value.to_string())
            .await
            .map_err(|e| FeedError::transport(e.to_string()))?;
        Ok(new_value)
    }

    /// One dispatch group's worth of `store`: a single pipelined `ZADD
    /// NX`+`ZREMRANGEBYRANK` per user, on one borrowed connection.
    async fn store_group(
        &self,
        cfg: &FeedConfig,
        group: &[UserId],
        event: &Event,
    ) -> Vec<(UserId, Result<bool, FeedError>)> {
        let mut conn = match self.pool.acquire(self.deadline).await {
            Ok(conn) => conn,
            Err(e) => return group.iter().map(|u| (u.clone(), Err(e.clone()))).collect(),
        };

        let mut pipe = redis::pipe();
        for user in group {
            let (data_key, _) = self.keys(cfg, user);
            let trim_from = -(cfg.max_size() as isize) - 1;
            pipe.cmd("ZADD")
                .arg(&data_key)
                .arg("NX")
                .arg(event.at())
                .arg(event.value());
            pipe.cmd("ZREMRANGEBYRANK")
                .arg(&data_key)
                .arg(0)
                .arg(trim_from)
                .ignore();
        }

        if debug_enabled() {
            tracing::debug!(namespace = cfg.namespace(), feed = %cfg.name(), users = group.len(), "store pipeline");
        }

        match pipe.query_async::<Vec<i64>>(conn.as_mut()).await {
            Ok(results) => group
                .iter()
                .enumerate()
                .map(|(i, user)| (user.clone(), Ok(results.get(i).copied().unwrap_or(0) > 0)))
                .collect(),
            Err(e) => {
                let err = FeedError::transport(e.to_string());
                group.iter().map(|u| (u.clone(), Err(err.clone()))).collect()
            }
        }
    }
}

#[async_trait]
impl Provider for RemoteProvider {
    #[instrument(skip(self, cfg, event), fields(feed = %cfg.name(), users = users.len()))]
    async fn store(&self, cfg: &FeedConfig, users: &[UserId], event: Event) -> Response<bool> {
        let group_futures = feed_core::batch::partition(users, cfg.batch_size())
            .map(|group| self.store_group(cfg, group, &event));
        let pairs = join_all(group_futures).await.into_iter().flatten().collect();
        Response::from_pairs(pairs)
    }

    async fn delete(&self, cfg: &FeedConfig, users: &[UserId], event: Event) -> Response<bool> {
        let pairs = dispatch_per_user(users, cfg.batch_size(), |user| async move {
            let (data_key, _) = self.keys(cfg, user);
            let mut conn = self.pool.acquire(self.deadline).await?;
            let removed: i64 = conn
                .as_mut()
                .zrem(&data_key, event.value())
                .await
                .map_err(|e| FeedError::transport(e.to_string()))?;
            Ok(removed > 0)
        })
        .await;
        Response::from_pairs(pairs)
    }

    async fn delete_if(&self, cfg: &FeedConfig, users: &[UserId], pred: DeletePredicate) -> Response<usize> {
        let pairs = dispatch_per_user(users, cfg.batch_size(), |user| {
            let (data_key, _) = self.keys(cfg, user);
            self.delete_if_one(data_key, user.clone(), pred.clone())
        })
        .await;
        Response::from_pairs(pairs)
    }

    async fn wipe(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<bool> {
        let pairs = dispatch_per_user(users, cfg.batch_size(), |user| async move {
            let (data_key, meta_key) = self.keys(cfg, user);
            let mut conn = self.pool.acquire(self.deadline).await?;
            let (a, b): (i64, i64) = redis::pipe()
                .del(&data_key)
                .del(&meta_key)
                .query_async(conn.as_mut())
                .await
                .map_err(|e| FeedError::transport(e.to_string()))?;
            Ok(a + b > 0)
        })
        .await;
        Response::from_pairs(pairs)
    }

    #[instrument(skip(self, cfg), fields(feed = %cfg.name(), page = req.page))]
    async fn paginate(&self, cfg: &FeedConfig, users: &[UserId], req: PageRequest) -> Response<Page> {
        if let Err(e) = validate_page_request(req) {
            return Response::error_for_all(users, e);
        }

        let pairs = dispatch_per_user(users, cfg.batch_size(), |user| {
            let (data_key, meta_key) = self.keys(cfg, user);
            self.paginate_one(data_key, meta_key, req)
        })
        .await;
        Response::from_pairs(pairs)
    }

    async fn fetch(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<Vec<Event>> {
        let pairs = dispatch_per_user(users, cfg.batch_size(), |user| {
            let (data_key, _) = self.keys(cfg, user);
            retry_idempotent(move || self.fetch_all(data_key.clone()))
        })
        .await;
        Response::from_pairs(pairs)
    }

    async fn reset_last_read(&self, cfg: &FeedConfig, users: &[UserId], at: Option<f64>) -> Response<f64> {
        let candidate = at.unwrap_or_else(now_secs);
        let pairs = dispatch_per_user(users, cfg.batch_size(), |user| {
            let (_, meta_key) = self.keys(cfg, user);
            self.bump_last_read(meta_key, candidate)
        })
        .await;
        Response::from_pairs(pairs)
    }

    async fn total_count(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<u64> {
        let pairs = dispatch_per_user(users, cfg.batch_size(), |user| {
            let (data_key, _) = self.keys(cfg, user);
            retry_idempotent(move || self.total_count_one(data_key.clone()))
        })
        .await;
        Response::from_pairs(pairs)
    }

    async fn unread_count(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<u64> {
        let pairs = dispatch_per_user(users, cfg.batch_size(), |user| {
            let (data_key, meta_key) = self.keys(cfg, user);
            retry_idempotent(move || self.unread_count_one(data_key.clone(), meta_key.clone()))
        })
        .await;
        Response::from_pairs(pairs)
    }

    async fn last_read(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<f64> {
        let pairs = dispatch_per_user(users, cfg.batch_size(), |user| {
            let (_, meta_key) = self.keys(cfg, user);
            retry_idempotent(move || self.last_read_of(meta_key.clone()))
        })
        .await;
        Response::from_pairs(pairs)
    }
}

impl RemoteProvider {
    async fn fetch_all(&self, data_key: String) -> Result<Vec<Event>, FeedError> {
        let mut conn = self.pool.acquire(self.deadline).await?;
        let raw: Vec<(Vec<u8>, f64)> = conn
            .as_mut()
            .zrevrange_withscores(&data_key, 0, -1)
            .await
            .map_err(|e| FeedError::transport(e.to_string()))?;
        Ok(raw.into_iter().map(|(value, at)| Event::with_at(value, at)).collect())
    }

    async fn total_count_one(&self, data_key: String) -> Result<u64, FeedError> {
        let mut conn = self.pool.acquire(self.deadline).await?;
        conn.as_mut()
            .zcard(&data_key)
            .await
            .map_err(|e| FeedError::transport(e.to_string()))
    }

    async fn unread_count_one(&self, data_key: String, meta_key: String) -> Result<u64, FeedError> {
        let last_read = self.last_read_of(meta_key).await?;
        let mut conn = self.pool.acquire(self.deadline).await?;
        conn.as_mut()
            .zcount(&data_key, format!("({last_read}"), "+inf")
            .await
            .map_err(|e| FeedError::transport(e.to_string()))
    }

    async fn paginate_one(&self, data_key: String, meta_key: String, req: PageRequest) -> Result<Page, FeedError> {
        let start = (req.page as i64 - 1) * req.per_page as i64;
        let stop = start + req.per_page as i64 - 1;

        let op = || async {
            let mut conn = self.pool.acquire(self.deadline).await?;
            let raw: Vec<(Vec<u8>, f64)> = conn
                .as_mut()
                .zrevrange_withscores(&data_key, start as isize, stop as isize)
                .await
                .map_err(|e| FeedError::transport(e.to_string()))?;
            let total = if req.with_total {
                let n: u64 = conn
                    .as_mut()
                    .zcard(&data_key)
                    .await
                    .map_err(|e| FeedError::transport(e.to_string()))?;
                Some(n)
            } else {
                None
            };
            Ok((raw, total))
        };

        let (raw, total) = if req.peek {
            retry_idempotent(op).await?
        } else {
            op().await?
        };

        let events: Vec<Event> = raw.into_iter().map(|(value, at)| Event::with_at(value, at)).collect();

        if !req.peek {
            if let Some(newest) = events.iter().map(Event::at).fold(None, |acc, at| {
                Some(acc.map_or(at, |m: f64| m.max(at)))
            }) {
                self.bump_last_read(meta_key, newest).await?;
            }
        }

        Ok(Page { events, total })
    }

    async fn delete_if_one(
        &self,
        data_key: String,
        user: UserId,
        pred: DeletePredicate,
    ) -> Result<usize, FeedError> {
        let mut conn = self.pool.acquire(self.deadline).await?;
        let raw: Vec<(Vec<u8>, f64)> = conn
            .as_mut()
            .zrange_withscores(&data_key, 0, -1)
            .await
            .map_err(|e| FeedError::transport(e.to_string()))?;

        let doomed: Vec<Vec<u8>> = raw
            .into_iter()
            .map(|(value, at)| (value.clone(), Event::with_at(value, at)))
            .filter(|(_, event)| pred(&user, event))
            .map(|(value, _)| value)
            .collect();

        if doomed.is_empty() {
            return Ok(0);
        }

        let removed: i64 = conn
            .as_mut()
            .zrem(&data_key, doomed)
            .await
            .map_err(|e| FeedError::transport(e.to_string()))?;
        Ok(removed as usize)
    }
}

fn now_secs() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
