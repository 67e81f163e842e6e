//! A from-scratch, bounded LIFO connection pool over
//! `redis::aio::MultiplexedConnection`.
//!
//! An explicit collaborator (`acquire(deadline)`/`release`), not something
//! borrowed from a pooling crate. The shape mirrors how the rest of this
//! workspace hand-rolls infrastructure it doesn't get from a dependency: a
//! `Semaphore` bounds concurrent checkouts, a plain `Mutex<Vec<_>>` is the
//! free list, and checked-out connections return themselves to the free
//! list on drop.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use redis::aio::MultiplexedConnection;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use feed_core::FeedError;

pub struct ConnectionPool {
    client: redis::Client,
    semaphore: Arc<Semaphore>,
    free: Mutex<Vec<MultiplexedConnection>>,
}

impl ConnectionPool {
    pub fn new(redis_url: impl AsRef<str>, max_size: usize) -> Result<Self, FeedError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| FeedError::transport(e.to_string()))?;

        Ok(Self {
            client,
            semaphore: Arc::new(Semaphore::new(max_size.max(1))),
            free: Mutex::new(Vec::new()),
        })
    }

    /// Check out a connection, waiting at most `deadline` for both a free
    /// pool slot and, if the free list is empty, a freshly dialed connection.
    pub async fn acquire(&self, deadline: Duration) -> Result<PooledConnection<'_>, FeedError> {
        let permit = tokio::time::timeout(deadline, self.semaphore.clone().acquire_owned())
            .await
            .map_err(|_| FeedError::transport("timed out acquiring a pool connection"))?
            .map_err(|_| FeedError::transport("connection pool is closed"))?;

        let cached = self.free.lock().expect("lock poisoned").pop();
        let conn = match cached {
            Some(conn) => conn,
            None => tokio::time::timeout(deadline, self.client.get_multiplexed_async_connection())
                .await
                .map_err(|_| FeedError::transport("timed out dialing a new connection"))?
                .map_err(|e| FeedError::transport(e.to_string()))?,
        };

        Ok(PooledConnection {
            conn: Some(conn),
            pool: self,
            _permit: permit,
        })
    }

    fn release(&self, conn: MultiplexedConnection) {
        self.free.lock().expect("lock poisoned").push(conn);
    }
}

/// A connection checked out of the pool. Returns itself to the free list
/// when dropped; never closed early, never leaked past the guard's scope.
pub struct PooledConnection<'a> {
    conn: Option<MultiplexedConnection>,
    pool: &'a ConnectionPool,
    _permit: OwnedSemaphorePermit,
}

impl<'a> PooledConnection<'a> {
    pub fn as_mut(&mut self) -> &mut MultiplexedConnection {
        self.conn.as_mut().expect("connection taken from a live guard")
    }
}

impl<'a> Drop for PooledConnection<'a> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}
