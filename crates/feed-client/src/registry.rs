//! Process-wide named-feed lookup.
//!
//! An explicit, constructible type (`FeedRegistry`) you can own and pass
//! around, plus a process-wide default instance behind a `OnceLock` as a
//! convenience for callers who don't need more than one registry.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use feed_core::{FeedConfig, FeedError, FeedResult};

use crate::activity::Activity;
use crate::users::Users;

/// Registration occurs once per name; re-registering an existing name,
/// even with an identical config, is always a `ConfigError`.
pub struct FeedRegistry {
    feeds: RwLock<HashMap<String, Arc<FeedConfig>>>,
}

impl FeedRegistry {
    pub fn new() -> Self {
        Self {
            feeds: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide default registry. Safe to call concurrently; the
    /// instance is created once on first use.
    pub fn default_instance() -> &'static FeedRegistry {
        static DEFAULT: OnceLock<FeedRegistry> = OnceLock::new();
        DEFAULT.get_or_init(FeedRegistry::new)
    }

    pub fn define(&self, name: impl Into<String>, config: FeedConfig) -> FeedResult<Arc<FeedConfig>> {
        let name = name.into();
        let mut feeds = self.feeds.write().expect("lock poisoned");
        if feeds.contains_key(&name) {
            return Err(FeedError::config(format!("feed '{name}' is already registered")));
        }
        let config = Arc::new(config);
        feeds.insert(name, config.clone());
        Ok(config)
    }

    pub fn get(&self, name: &str) -> Option<Arc<FeedConfig>> {
        self.feeds.read().expect("lock poisoned").get(name).cloned()
    }

    /// Look up `name` and build an [`Activity`] bound to `users`.
    pub fn activity(&self, name: &str, users: impl Into<Users>) -> FeedResult<Activity> {
        let config = self
            .get(name)
            .ok_or_else(|| FeedError::config(format!("feed '{name}' is not registered")))?;
        Ok(Activity::new(config, users))
    }
}

impl Default for FeedRegistry {
    fn default() -> Self {
        Self::new()
    }
}
