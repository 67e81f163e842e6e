//! The caller-facing surface: the `Activity`/`SingleActivity` handles, the
//! process-wide feed registry, and the block-scope DSL. No provider logic
//! lives here; this crate only routes to whatever
//! `Arc<dyn feed_core::Provider>` a `FeedConfig` carries.

pub mod activity;
pub mod registry;
pub mod scope;
pub mod users;

pub use activity::{Activity, SingleActivity};
pub use registry::FeedRegistry;
pub use scope::{with_scope, Scope};
pub use users::Users;
