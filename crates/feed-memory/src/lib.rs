//! The in-memory reference [`feed_core::Provider`]: a faithful, non-sharded
//! implementation used for tests and small deployments.

pub mod dump;
pub mod provider;
pub mod state;

pub use dump::UserDump;
pub use provider::InMemoryProvider;
pub use state::UserFeedState;
