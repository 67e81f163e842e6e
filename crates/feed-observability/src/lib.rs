//! Process-wide tracing initialization, shared by every `feed-*` crate.
//!
//! Every operation in `feed-memory`/`feed-remote` logs through `tracing`
//! (`#[instrument]`, `tracing::debug!`), never `println!`; this crate is
//! just the one place that turns those events into output.

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the process. Safe to call multiple times;
/// later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
