//! The batched `Activity` handle: binds a feed configuration to a list of
//! user ids and routes every operation to the provider.
//!
//! One struct, composed from its collaborators (`Arc<dyn Provider>`,
//! `Arc<FeedConfig>`), with behavior that varies by the data it holds
//! rather than by a trait-object hierarchy of handle "kinds".

use std::sync::Arc;

use feed_core::{DeletePredicate, Event, FeedConfig, Page, PageRequest, Provider, Response, UserId};

use crate::users::Users;

/// A feed handle bound to one or many users. Always dispatches in batch and
/// always returns a [`Response`]; [`crate::SingleActivity`] is the thin
/// adapter that unwraps a one-user `Response` to a scalar.
pub struct Activity {
    config: Arc<FeedConfig>,
    users: Users,
}

impl Activity {
    pub fn new(config: Arc<FeedConfig>, users: impl Into<Users>) -> Self {
        Self {
            config,
            users: users.into(),
        }
    }

    pub fn config(&self) -> &Arc<FeedConfig> {
        &self.config
    }

    pub fn users(&self) -> &Users {
        &self.users
    }

    fn provider(&self) -> &Arc<dyn Provider> {
        self.config.provider()
    }

    pub async fn store(&self, event: Event) -> Response<bool> {
        self.provider().store(&self.config, &self.users.as_slice(), event).await
    }

    pub async fn delete(&self, event: Event) -> Response<bool> {
        self.provider().delete(&self.config, &self.users.as_slice(), event).await
    }

    pub async fn delete_if(&self, pred: DeletePredicate) -> Response<usize> {
        self.provider().delete_if(&self.config, &self.users.as_slice(), pred).await
    }

    pub async fn wipe(&self) -> Response<bool> {
        self.provider().wipe(&self.config, &self.users.as_slice()).await
    }

    pub async fn paginate(&self, req: PageRequest) -> Response<Page> {
        self.provider().paginate(&self.config, &self.users.as_slice(), req).await
    }

    pub async fn fetch(&self) -> Response<Vec<Event>> {
        self.provider().fetch(&self.config, &self.users.as_slice()).await
    }

    pub async fn reset_last_read(&self, at: Option<f64>) -> Response<f64> {
        self.provider().reset_last_read(&self.config, &self.users.as_slice(), at).await
    }

    pub async fn total_count(&self) -> Response<u64> {
        self.provider().total_count(&self.config, &self.users.as_slice()).await
    }

    pub async fn unread_count(&self) -> Response<u64> {
        self.provider().unread_count(&self.config, &self.users.as_slice()).await
    }

    pub async fn last_read(&self) -> Response<f64> {
        self.provider().last_read(&self.config, &self.users.as_slice()).await
    }
}

/// Thin single-user adapter over [`Activity`]: same batched dispatch,
/// unwrapped to the scalar for its one user (or the captured error, raised).
pub struct SingleActivity {
    inner: Activity,
}

impl SingleActivity {
    pub fn new(config: Arc<FeedConfig>, user: UserId) -> Self {
        Self {
            inner: Activity::new(config, Users::One(user)),
        }
    }

    pub fn user_id(&self) -> &UserId {
        match self.inner.users() {
            Users::One(id) => id,
            Users::Many(_) => unreachable!("SingleActivity is always constructed with Users::One"),
        }
    }

    pub fn config(&self) -> &Arc<FeedConfig> {
        self.inner.config()
    }

    pub async fn store(&self, event: Event) -> feed_core::FeedResult<bool> {
        self.inner.store(event).await.into_single()
    }

    pub async fn delete(&self, event: Event) -> feed_core::FeedResult<bool> {
        self.inner.delete(event).await.into_single()
    }

    pub async fn delete_if(&self, pred: DeletePredicate) -> feed_core::FeedResult<usize> {
        self.inner.delete_if(pred).await.into_single()
    }

    pub async fn wipe(&self) -> feed_core::FeedResult<bool> {
        self.inner.wipe().await.into_single()
    }

    pub async fn paginate(&self, req: PageRequest) -> feed_core::FeedResult<Page> {
        self.inner.paginate(req).await.into_single()
    }

    pub async fn fetch(&self) -> feed_core::FeedResult<Vec<Event>> {
        self.inner.fetch().await.into_single()
    }

    pub async fn reset_last_read(&self, at: Option<f64>) -> feed_core::FeedResult<f64> {
        self.inner.reset_last_read(at).await.into_single()
    }

    pub async fn total_count(&self) -> feed_core::FeedResult<u64> {
        self.inner.total_count().await.into_single()
    }

    pub async fn unread_count(&self) -> feed_core::FeedResult<u64> {
        self.inner.unread_count().await.into_single()
    }

    pub async fn last_read(&self) -> feed_core::FeedResult<f64> {
        self.inner.last_read().await.into_single()
    }
}
