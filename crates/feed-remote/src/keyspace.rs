//! Remote keyspace layout: every key a provider touches is prefixed
//! `<namespace>|<feed_name>|`, so distinct feeds can share one keyspace
//! without collision.

/// Sorted-set key holding a user's events (members = value, scores = at).
pub fn data_key(namespace: &str, feed: &str, user: &str) -> String {
    format!("{namespace}|{feed}|data|{user}")
}

/// Hash key holding a user's `last_read` watermark.
pub fn meta_key(namespace: &str, feed: &str, user: &str) -> String {
    format!("{namespace}|{feed}|meta|{user}")
}

pub(crate) const LAST_READ_FIELD: &str = "last_read";
