//! Shared fan-out helper: split a user id list into dispatch groups.
//!
//! Both providers partition the same way; only what they do with each group
//! differs (pipeline-on-one-connection for `feed-remote`, sequential
//! per-user locks for `feed-memory`).

use crate::ids::UserId;

/// Split `users` into groups of at most `batch_size` (minimum 1).
pub fn partition<'a>(users: &'a [UserId], batch_size: usize) -> impl Iterator<Item = &'a [UserId]> {
    users.chunks(batch_size.max(1))
}
