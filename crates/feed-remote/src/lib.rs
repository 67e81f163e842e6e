//! The production, Redis-style sorted-set [`feed_core::Provider`]: a
//! precise keyspace layout, a hand-rolled bounded connection pool, and
//! bounded retry of idempotent reads.

pub mod keyspace;
pub mod pool;
pub mod provider;
pub mod retry;

pub use pool::{ConnectionPool, PooledConnection};
pub use provider::RemoteProvider;
