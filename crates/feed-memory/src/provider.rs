//! The in-memory reference [`Provider`](feed_core::Provider).
//!
//! Intended for tests and small deployments, not high-throughput production
//! use. Each `(namespace, feed, user_id)` triple gets its
//! own `RwLock<UserFeedState>`; the outer map lock is only ever held for the
//! brief get-or-insert, never across a user's operation, so two users never
//! contend with each other.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use feed_core::{
    provider::{validate_page_request, DeletePredicate, Page, PageRequest},
    Event, FeedConfig, FeedName, Provider, Response, UserId,
};
use tracing::instrument;

use crate::state::UserFeedState;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StreamKey {
    namespace: Arc<str>,
    feed: FeedName,
    user: UserId,
}

/// In-memory, per-user-locked reference provider.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    streams: RwLock<HashMap<StreamKey, Arc<RwLock<UserFeedState>>>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_for(&self, cfg: &FeedConfig, user: &UserId) -> Arc<RwLock<UserFeedState>> {
        let key = StreamKey {
            namespace: Arc::from(cfg.namespace()),
            feed: cfg.name().clone(),
            user: user.clone(),
        };

        if let Some(existing) = self.streams.read().expect("lock poisoned").get(&key) {
            return existing.clone();
        }

        self.streams
            .write()
            .expect("lock poisoned")
            .entry(key)
            .or_insert_with(|| Arc::new(RwLock::new(UserFeedState::new(cfg.max_size()))))
            .clone()
    }

    /// Export the full state of every user currently tracked under `cfg`'s
    /// `(namespace, feed)` pair, for the dump/restore fixture format (§6,
    /// §8 P8).
    pub fn dump(&self, cfg: &FeedConfig) -> HashMap<UserId, crate::dump::UserDump> {
        let streams = self.streams.read().expect("lock poisoned");
        streams
            .iter()
            .filter(|(key, _)| key.namespace.as_ref() == cfg.namespace() && &key.feed == cfg.name())
            .map(|(key, state)| {
                let state = state.read().expect("lock poisoned");
                (key.user.clone(), crate::dump::UserDump::from_state(&state))
            })
            .collect()
    }

    /// Load state previously produced by [`InMemoryProvider::dump`],
    /// overwriting whatever was tracked for these users under `cfg`.
    pub fn restore(&self, cfg: &FeedConfig, data: HashMap<UserId, crate::dump::UserDump>) {
        let mut streams = self.streams.write().expect("lock poisoned");
        for (user, dump) in data {
            let key = StreamKey {
                namespace: Arc::from(cfg.namespace()),
                feed: cfg.name().clone(),
                user,
            };
            streams.insert(key, Arc::new(RwLock::new(dump.into_state(cfg.max_size()))));
        }
    }
}

#[async_trait]
impl Provider for InMemoryProvider {
    #[instrument(skip(self, cfg, event), fields(feed = %cfg.name(), users = users.len()))]
    async fn store(&self, cfg: &FeedConfig, users: &[UserId], event: Event) -> Response<bool> {
        let mut pairs = Vec::with_capacity(users.len());
        for group in feed_core::batch::partition(users, cfg.batch_size()) {
            for user in group {
                let state = self.state_for(cfg, user);
                let inserted = state.write().expect("lock poisoned").store(event.clone());
                pairs.push((user.clone(), Ok(inserted)));
            }
        }
        Response::from_pairs(pairs)
    }

    async fn delete(&self, cfg: &FeedConfig, users: &[UserId], event: Event) -> Response<bool> {
        let pairs = users
            .iter()
            .map(|user| {
                let state = self.state_for(cfg, user);
                let removed = state.write().expect("lock poisoned").delete(event.value());
                (user.clone(), Ok(removed))
            })
            .collect();
        Response::from_pairs(pairs)
    }

    async fn delete_if(&self, cfg: &FeedConfig, users: &[UserId], pred: DeletePredicate) -> Response<usize> {
        let pairs = users
            .iter()
            .map(|user| {
                let state = self.state_for(cfg, user);
                let removed = state
                    .write()
                    .expect("lock poisoned")
                    .delete_if(|e| pred(user, e));
                (user.clone(), Ok(removed))
            })
            .collect();
        Response::from_pairs(pairs)
    }

    async fn wipe(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<bool> {
        let pairs = users
            .iter()
            .map(|user| {
                let state = self.state_for(cfg, user);
                let existed = state.write().expect("lock poisoned").wipe();
                (user.clone(), Ok(existed))
            })
            .collect();
        Response::from_pairs(pairs)
    }

    #[instrument(skip(self, cfg), fields(feed = %cfg.name(), page = req.page))]
    async fn paginate(&self, cfg: &FeedConfig, users: &[UserId], req: PageRequest) -> Response<Page> {
        if let Err(e) = validate_page_request(req) {
            return Response::error_for_all(users, e);
        }

        let pairs = users
            .iter()
            .map(|user| {
                let state = self.state_for(cfg, user);
                let mut state = state.write().expect("lock poisoned");
                let events = state.paginate(req.page, req.per_page, req.peek);
                let total = req.with_total.then(|| state.total_count());
                (user.clone(), Ok(Page { events, total }))
            })
            .collect();
        Response::from_pairs(pairs)
    }

    async fn fetch(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<Vec<Event>> {
        let pairs = users
            .iter()
            .map(|user| {
                let state = self.state_for(cfg, user);
                let events = state.read().expect("lock poisoned").fetch();
                (user.clone(), Ok(events))
            })
            .collect();
        Response::from_pairs(pairs)
    }

    async fn reset_last_read(&self, cfg: &FeedConfig, users: &[UserId], at: Option<f64>) -> Response<f64> {
        let pairs = users
            .iter()
            .map(|user| {
                let state = self.state_for(cfg, user);
                let new_at = state.write().expect("lock poisoned").reset_last_read(at);
                (user.clone(), Ok(new_at))
            })
            .collect();
        Response::from_pairs(pairs)
    }

    async fn total_count(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<u64> {
        let pairs = users
            .iter()
            .map(|user| {
                let state = self.state_for(cfg, user);
                let n = state.read().expect("lock poisoned").total_count();
                (user.clone(), Ok(n))
            })
            .collect();
        Response::from_pairs(pairs)
    }

    async fn unread_count(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<u64> {
        let pairs = users
            .iter()
            .map(|user| {
                let state = self.state_for(cfg, user);
                let n = state.read().expect("lock poisoned").unread_count();
                (user.clone(), Ok(n))
            })
            .collect();
        Response::from_pairs(pairs)
    }

    async fn last_read(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<f64> {
        let pairs = users
            .iter()
            .map(|user| {
                let state = self.state_for(cfg, user);
                let at = state.read().expect("lock poisoned").last_read();
                (user.clone(), Ok(at))
            })
            .collect();
        Response::from_pairs(pairs)
    }
}
