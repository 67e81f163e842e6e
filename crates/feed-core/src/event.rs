//! The immutable unit stored in a user's feed.

use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// An opaque value plus the score it was stored under.
///
/// Identity is by `value` alone: `at` is carried for ordering and unread
/// bookkeeping but two events with the same value are the same event, no
/// matter when they were minted. Construction always goes through `new`/
/// `with_at`; there is no setter, so an `Event` can't drift from what was
/// originally stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    value: Vec<u8>,
    at: f64,
}

impl Event {
    /// Build an event stamped with the current wall-clock time.
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self::with_at(value, now_secs())
    }

    /// Build an event with an explicit score (Unix-epoch seconds).
    pub fn with_at(value: impl Into<Vec<u8>>, at: f64) -> Self {
        Self {
            value: value.into(),
            at,
        }
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn at(&self) -> f64 {
        self.at
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Event {}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
