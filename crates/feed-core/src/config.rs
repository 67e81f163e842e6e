//! Immutable per-feed configuration.

use std::sync::Arc;

use crate::error::FeedError;
use crate::ids::FeedName;
use crate::provider::Provider;

/// Defaults used when a [`FeedConfigBuilder`] doesn't set a field.
pub struct Defaults;

impl Defaults {
    pub const PER_PAGE: usize = 50;
    pub const BATCH_SIZE: usize = 10;
    /// `per_page * 10`, applied when `max_size` isn't set explicitly. See
    /// DESIGN.md for why this default was chosen.
    pub fn max_size_for(per_page: usize) -> usize {
        per_page * 10
    }
}

/// Immutable configuration bound to one registered feed name.
///
/// `provider`, `per_page`, `batch_size`, `namespace`, and `max_size` are the
/// recognized options; `name` is carried alongside so a `FeedConfig` is
/// self-sufficient for keyspacing without threading the registry key
/// through every provider call.
#[derive(Clone)]
pub struct FeedConfig {
    pub(crate) name: FeedName,
    pub(crate) provider: Arc<dyn Provider>,
    pub(crate) per_page: usize,
    pub(crate) batch_size: usize,
    pub(crate) namespace: Arc<str>,
    pub(crate) max_size: usize,
}

impl FeedConfig {
    pub fn builder(name: FeedName, provider: Arc<dyn Provider>) -> FeedConfigBuilder {
        FeedConfigBuilder::new(name, provider)
    }

    pub fn name(&self) -> &FeedName {
        &self.name
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

/// Builder for [`FeedConfig`].
///
/// Each setter overwrites the previous value for that field (last-wins):
/// calling `.per_page(50).per_page(2)` yields `2`. What `FeedRegistry::define`
/// refuses is re-registering the same *feed name* with a different config,
/// not re-setting a builder field.
pub struct FeedConfigBuilder {
    name: FeedName,
    provider: Arc<dyn Provider>,
    per_page: usize,
    batch_size: usize,
    namespace: Option<Arc<str>>,
    max_size: Option<usize>,
}

impl FeedConfigBuilder {
    fn new(name: FeedName, provider: Arc<dyn Provider>) -> Self {
        Self {
            name,
            provider,
            per_page: Defaults::PER_PAGE,
            batch_size: Defaults::BATCH_SIZE,
            namespace: None,
            max_size: None,
        }
    }

    pub fn per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn namespace(mut self, namespace: impl Into<Arc<str>>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn build(self) -> Result<FeedConfig, FeedError> {
        if self.per_page == 0 {
            return Err(FeedError::config("per_page must be positive"));
        }
        if self.batch_size == 0 {
            return Err(FeedError::config("batch_size must be positive"));
        }
        let namespace = self
            .namespace
            .ok_or_else(|| FeedError::config("namespace is required"))?;
        if namespace.is_empty() {
            return Err(FeedError::config("namespace must not be empty"));
        }
        let max_size = self
            .max_size
            .unwrap_or_else(|| Defaults::max_size_for(self.per_page));
        if max_size == 0 {
            return Err(FeedError::config("max_size must be positive"));
        }

        Ok(FeedConfig {
            name: self.name,
            provider: self.provider,
            per_page: self.per_page,
            batch_size: self.batch_size,
            namespace,
            max_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::response::Response;
    use async_trait::async_trait;

    struct NullProvider;

    #[async_trait]
    impl Provider for NullProvider {
        async fn store(&self, _: &FeedConfig, users: &[crate::ids::UserId], _: Event) -> Response<bool> {
            Response::error_for_all(users, FeedError::provider("unimplemented"))
        }
        async fn delete(&self, _: &FeedConfig, users: &[crate::ids::UserId], _: Event) -> Response<bool> {
            Response::error_for_all(users, FeedError::provider("unimplemented"))
        }
        async fn delete_if(
            &self,
            _: &FeedConfig,
            users: &[crate::ids::UserId],
            _: crate::provider::DeletePredicate,
        ) -> Response<usize> {
            Response::error_for_all(users, FeedError::provider("unimplemented"))
        }
        async fn wipe(&self, _: &FeedConfig, users: &[crate::ids::UserId]) -> Response<bool> {
            Response::error_for_all(users, FeedError::provider("unimplemented"))
        }
        async fn paginate(
            &self,
            _: &FeedConfig,
            users: &[crate::ids::UserId],
            _: crate::provider::PageRequest,
        ) -> Response<crate::provider::Page> {
            Response::error_for_all(users, FeedError::provider("unimplemented"))
        }
        async fn fetch(&self, _: &FeedConfig, users: &[crate::ids::UserId]) -> Response<Vec<Event>> {
            Response::error_for_all(users, FeedError::provider("unimplemented"))
        }
        async fn reset_last_read(
            &self,
            _: &FeedConfig,
            users: &[crate::ids::UserId],
            _: Option<f64>,
        ) -> Response<f64> {
            Response::error_for_all(users, FeedError::provider("unimplemented"))
        }
        async fn total_count(&self, _: &FeedConfig, users: &[crate::ids::UserId]) -> Response<u64> {
            Response::error_for_all(users, FeedError::provider("unimplemented"))
        }
        async fn unread_count(&self, _: &FeedConfig, users: &[crate::ids::UserId]) -> Response<u64> {
            Response::error_for_all(users, FeedError::provider("unimplemented"))
        }
        async fn last_read(&self, _: &FeedConfig, users: &[crate::ids::UserId]) -> Response<f64> {
            Response::error_for_all(users, FeedError::provider("unimplemented"))
        }
    }

    #[test]
    fn default_max_size_is_ten_pages() {
        let name = FeedName::new("timeline").unwrap();
        let cfg = FeedConfig::builder(name, Arc::new(NullProvider))
            .namespace("app")
            .build()
            .unwrap();
        assert_eq!(cfg.max_size(), Defaults::PER_PAGE * 10);
    }

    #[test]
    fn last_setter_call_wins() {
        let name = FeedName::new("timeline").unwrap();
        let cfg = FeedConfig::builder(name, Arc::new(NullProvider))
            .namespace("app")
            .per_page(50)
            .per_page(2)
            .build()
            .unwrap();
        assert_eq!(cfg.per_page(), 2);
    }

    #[test]
    fn missing_namespace_is_a_config_error() {
        let name = FeedName::new("timeline").unwrap();
        let err = FeedConfig::builder(name, Arc::new(NullProvider))
            .build()
            .unwrap_err();
        assert!(matches!(err, FeedError::Config(_)));
    }
}
