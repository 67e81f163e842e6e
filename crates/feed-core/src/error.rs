//! Feed error taxonomy.
//!
//! Mirrors the propagation policy: `Config`/`Argument` are raised
//! synchronously and never enter a [`crate::response::Response`];
//! `Transport`/`Timeout`/`Provider`/`NotFound` are the kinds a provider may
//! capture per-user inside a batch response.

use thiserror::Error;

/// Result type used across the feed stack.
pub type FeedResult<T> = Result<T, FeedError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// Invalid or missing configuration, or duplicate feed registration.
    #[error("config error: {0}")]
    Config(String),

    /// Invalid per_page/page, nil user_id, empty user list.
    #[error("argument error: {0}")]
    Argument(String),

    /// Connection acquisition failed, or network I/O failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// A batched call exceeded its deadline.
    #[error("timeout")]
    Timeout,

    /// The backend returned an unexpected reply.
    #[error("provider error: {0}")]
    Provider(String),

    /// The requested user has no state and the operation requires existence.
    #[error("not found")]
    NotFound,
}

impl FeedError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn argument(msg: impl Into<String>) -> Self {
        Self::Argument(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Whether this error is worth retrying for an idempotent operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
