//! Core types shared by every layer of the activity feed stack: the `Event`
//! value, opaque identifiers, the error taxonomy, per-feed configuration,
//! the `Provider` contract, and the batch `Response` container.
//!
//! This crate has no IO of its own; `feed-memory` and `feed-remote` each
//! provide one `Provider` implementation.

pub mod batch;
pub mod config;
pub mod error;
pub mod event;
pub mod ids;
pub mod provider;
pub mod response;

pub use config::{Defaults, FeedConfig, FeedConfigBuilder};
pub use error::{FeedError, FeedResult};
pub use event::Event;
pub use ids::{FeedName, UserId};
pub use provider::{DeletePredicate, Page, PageRequest, Provider};
pub use response::Response;
