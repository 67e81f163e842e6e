//! End-to-end scenarios S1-S6 and property P9, exercising the full
//! `Activity`/`SingleActivity` + `FeedRegistry` surface against the
//! in-memory provider.

use std::sync::Arc;

use async_trait::async_trait;
use feed_client::{Activity, FeedRegistry, SingleActivity};
use feed_core::{
    DeletePredicate, Event, FeedConfig, FeedError, FeedName, Page, PageRequest, Provider, Response, UserId,
};
use feed_memory::InMemoryProvider;

/// Wraps an [`InMemoryProvider`] and forces every call for one configured
/// user to fail with a provider error, delegating every other user to the
/// inner provider unchanged. Models a single backend node going bad while
/// its siblings keep serving, the way a real `Provider` would surface a
/// per-user transport failure.
struct FlakyProvider {
    inner: InMemoryProvider,
    failing_user: UserId,
}

impl FlakyProvider {
    fn new(inner: InMemoryProvider, failing_user: UserId) -> Self {
        Self { inner, failing_user }
    }

    /// Splits `users` into the flaky one (if present) and the rest,
    /// dispatches the rest through `op`, then merges in an error entry for
    /// the flaky one, preserving the original ordering.
    async fn dispatch<T, F, Fut>(&self, users: &[UserId], op: F) -> Response<T>
    where
        T: Clone,
        F: FnOnce(&[UserId]) -> Fut,
        Fut: std::future::Future<Output = Response<T>>,
    {
        let healthy: Vec<UserId> = users.iter().filter(|u| **u != self.failing_user).cloned().collect();
        let healthy_response = op(&healthy).await;

        let pairs = users
            .iter()
            .map(|u| {
                if *u == self.failing_user {
                    (u.clone(), Err(FeedError::provider("simulated backend failure")))
                } else {
                    let value = healthy_response.get(u).expect("dispatched user has a result").clone();
                    (u.clone(), value)
                }
            })
            .collect();
        Response::from_pairs(pairs)
    }
}

#[async_trait]
impl Provider for FlakyProvider {
    async fn store(&self, cfg: &FeedConfig, users: &[UserId], event: Event) -> Response<bool> {
        self.dispatch(users, |u| self.inner.store(cfg, u, event.clone())).await
    }
    async fn delete(&self, cfg: &FeedConfig, users: &[UserId], event: Event) -> Response<bool> {
        self.dispatch(users, |u| self.inner.delete(cfg, u, event.clone())).await
    }
    async fn delete_if(&self, cfg: &FeedConfig, users: &[UserId], pred: DeletePredicate) -> Response<usize> {
        self.dispatch(users, |u| self.inner.delete_if(cfg, u, pred.clone())).await
    }
    async fn wipe(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<bool> {
        self.dispatch(users, |u| self.inner.wipe(cfg, u)).await
    }
    async fn paginate(&self, cfg: &FeedConfig, users: &[UserId], req: PageRequest) -> Response<Page> {
        self.dispatch(users, |u| self.inner.paginate(cfg, u, req)).await
    }
    async fn fetch(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<Vec<Event>> {
        self.dispatch(users, |u| self.inner.fetch(cfg, u)).await
    }
    async fn reset_last_read(&self, cfg: &FeedConfig, users: &[UserId], at: Option<f64>) -> Response<f64> {
        self.dispatch(users, |u| self.inner.reset_last_read(cfg, u, at)).await
    }
    async fn total_count(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<u64> {
        self.dispatch(users, |u| self.inner.total_count(cfg, u)).await
    }
    async fn unread_count(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<u64> {
        self.dispatch(users, |u| self.inner.unread_count(cfg, u)).await
    }
    async fn last_read(&self, cfg: &FeedConfig, users: &[UserId]) -> Response<f64> {
        self.dispatch(users, |u| self.inner.last_read(cfg, u)).await
    }
}

fn registry_with_feed(max_size: usize) -> (FeedRegistry, Arc<InMemoryProvider>) {
    let provider = Arc::new(InMemoryProvider::new());
    let registry = FeedRegistry::new();
    let config = feed_core::FeedConfig::builder(FeedName::new("timeline").unwrap(), provider.clone())
        .namespace("app")
        .max_size(max_size)
        .build()
        .unwrap();
    registry.define("timeline", config).unwrap();
    (registry, provider)
}

fn uid(s: &str) -> UserId {
    UserId::new(s).unwrap()
}

#[tokio::test]
async fn s1_dedup() {
    let (registry, _) = registry_with_feed(50);
    let config = registry.get("timeline").unwrap();
    let activity = SingleActivity::new(config, uid("1"));

    assert_eq!(activity.store(Event::with_at("hello", 1000.0)).await.unwrap(), true);
    assert_eq!(activity.store(Event::with_at("hello", 2000.0)).await.unwrap(), false);

    let events = activity.fetch().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].at(), 1000.0);
}

#[tokio::test]
async fn s2_trimming() {
    let (registry, _) = registry_with_feed(3);
    let config = registry.get("timeline").unwrap();
    let activity = SingleActivity::new(config, uid("1"));

    for (value, at) in [("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)] {
        activity.store(Event::with_at(value, at)).await.unwrap();
    }

    let events = activity.fetch().await.unwrap();
    let values: Vec<&[u8]> = events.iter().map(Event::value).collect();
    assert_eq!(values, vec![b"d".as_slice(), b"c".as_slice(), b"b".as_slice()]);
    assert_eq!(activity.total_count().await.unwrap(), 3);
}

#[tokio::test]
async fn s3_unread_watermark() {
    let (registry, _) = registry_with_feed(50);
    let config = registry.get("timeline").unwrap();
    let activity = SingleActivity::new(config, uid("1"));

    activity.store(Event::with_at("x", 10.0)).await.unwrap();
    activity.store(Event::with_at("y", 20.0)).await.unwrap();
    activity.store(Event::with_at("z", 30.0)).await.unwrap();
    assert_eq!(activity.unread_count().await.unwrap(), 3);

    let page = activity
        .paginate(PageRequest { page: 1, per_page: 2, peek: false, with_total: false })
        .await
        .unwrap();
    let values: Vec<&[u8]> = page.events.iter().map(Event::value).collect();
    assert_eq!(values, vec![b"z".as_slice(), b"y".as_slice()]);

    assert_eq!(activity.last_read().await.unwrap(), 30.0);
    assert_eq!(activity.unread_count().await.unwrap(), 0);
}

#[tokio::test]
async fn s4_peek() {
    let (registry, _) = registry_with_feed(50);
    let config = registry.get("timeline").unwrap();
    let activity = SingleActivity::new(config, uid("1"));

    activity.store(Event::with_at("x", 10.0)).await.unwrap();
    activity.store(Event::with_at("y", 20.0)).await.unwrap();
    activity.store(Event::with_at("z", 30.0)).await.unwrap();

    activity
        .paginate(PageRequest { page: 1, per_page: 2, peek: true, with_total: false })
        .await
        .unwrap();

    assert_eq!(activity.unread_count().await.unwrap(), 3);
    assert_eq!(activity.last_read().await.unwrap(), 0.0);
}

#[tokio::test]
async fn s5_batch_partial_failure_is_isolated_per_user() {
    let provider = Arc::new(FlakyProvider::new(InMemoryProvider::new(), uid("2")));
    let registry = FeedRegistry::new();
    let config = feed_core::FeedConfig::builder(FeedName::new("timeline").unwrap(), provider)
        .namespace("app")
        .max_size(50)
        .build()
        .unwrap();
    registry.define("timeline", config).unwrap();
    let config = registry.get("timeline").unwrap();

    let users = vec![uid("1"), uid("2"), uid("3")];
    let activity = Activity::new(config, users.clone());

    let response = activity.store(Event::with_at("x", 1.0)).await;
    assert_eq!(response.user_ids(), users.as_slice());
    assert!(response.has_errors());
    assert!(response.value_or_raise(&uid("1")).is_ok());
    assert!(response.value_or_raise(&uid("3")).is_ok());
    assert!(matches!(
        response.value_or_raise(&uid("2")),
        Err(FeedError::Provider(_))
    ));

    // The failure is per-user, not a shared failure path: users 1 and 3
    // went on to actually store their event.
    let fetched = activity.fetch().await;
    assert_eq!(fetched.value_or_raise(&uid("1")).unwrap().len(), 1);
    assert_eq!(fetched.value_or_raise(&uid("3")).unwrap().len(), 1);
    assert!(matches!(
        fetched.value_or_raise(&uid("2")),
        Err(FeedError::Provider(_))
    ));
}

#[tokio::test]
async fn s6_delete_if() {
    let (registry, _) = registry_with_feed(50);
    let config = registry.get("timeline").unwrap();
    let activity = SingleActivity::new(config, uid("1"));

    for at in 1..=10 {
        activity.store(Event::with_at(format!("e{at}"), at as f64)).await.unwrap();
    }

    let pred: DeletePredicate = Arc::new(|_user: &UserId, e: &Event| (e.at() as i64) % 2 == 0);
    let removed = activity.delete_if(pred).await.unwrap();
    assert_eq!(removed, 5);

    let events = activity.fetch().await.unwrap();
    assert!(events.iter().all(|e| (e.at() as i64) % 2 == 1));
}

#[tokio::test]
async fn p9_response_preserves_order_and_per_user_errors() {
    let (registry, _) = registry_with_feed(50);
    let config = registry.get("timeline").unwrap();
    let users = vec![uid("1"), uid("2"), uid("3")];
    let activity = Activity::new(config, users.clone());

    let response = activity.store(Event::with_at("x", 1.0)).await;
    let order: Vec<UserId> = response.iter().map(|(u, _)| u.clone()).collect();
    assert_eq!(order, users);
}
