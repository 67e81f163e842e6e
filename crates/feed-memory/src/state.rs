//! Per-user feed state: an ordered set of events plus a `last_read`
//! watermark.
//!
//! Mirrors how a sorted-set backend actually stores this (a score-ordered
//! index plus a value→score lookup, the way Redis pairs a skip list with a
//! dict for `ZADD`/`ZSCORE`), so the in-memory provider and the remote
//! provider agree on what "the state" means even though they're implemented
//! on top of completely different primitives.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use feed_core::Event;

#[derive(Debug, Clone)]
struct ScoreKey {
    at: f64,
    value: Vec<u8>,
}

impl PartialEq for ScoreKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for ScoreKey {}

impl PartialOrd for ScoreKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoreKey {
    /// Ascending by `at` (oldest first), ties broken by `value`: a
    /// deterministic, stable order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.at
            .total_cmp(&other.at)
            .then_with(|| self.value.cmp(&other.value))
    }
}

/// One user's feed: an ordered set of events plus a read watermark.
#[derive(Debug, Default)]
pub struct UserFeedState {
    by_value: HashMap<Vec<u8>, f64>,
    by_score: BTreeSet<ScoreKey>,
    last_read: f64,
    max_size: usize,
}

impl UserFeedState {
    pub fn new(max_size: usize) -> Self {
        Self {
            by_value: HashMap::new(),
            by_score: BTreeSet::new(),
            last_read: 0.0,
            max_size: max_size.max(1),
        }
    }

    /// `store`: add-if-absent, trimming the oldest entry on overflow.
    /// Returns `true` if newly inserted.
    pub fn store(&mut self, event: Event) -> bool {
        if self.by_value.contains_key(event.value()) {
            return false;
        }

        self.by_value.insert(event.value().to_vec(), event.at());
        self.by_score.insert(ScoreKey {
            at: event.at(),
            value: event.value().to_vec(),
        });

        while self.by_score.len() > self.max_size {
            if let Some(oldest) = self.by_score.pop_first() {
                self.by_value.remove(&oldest.value);
            }
        }

        true
    }

    /// `delete`: idempotent removal by value.
    pub fn delete(&mut self, value: &[u8]) -> bool {
        match self.by_value.remove(value) {
            Some(at) => {
                self.by_score.remove(&ScoreKey {
                    at,
                    value: value.to_vec(),
                });
                true
            }
            None => false,
        }
    }

    /// `delete_if`: predicate invoked once per event, returns count removed.
    pub fn delete_if(&mut self, mut pred: impl FnMut(&Event) -> bool) -> usize {
        let doomed: Vec<ScoreKey> = self
            .by_score
            .iter()
            .filter(|k| pred(&Event::with_at(k.value.clone(), k.at)))
            .cloned()
            .collect();

        for key in &doomed {
            self.by_score.remove(key);
            self.by_value.remove(&key.value);
        }

        doomed.len()
    }

    /// `wipe`: reset to the freshly-created state. Returns whether there was
    /// any prior state to clear.
    pub fn wipe(&mut self) -> bool {
        let had_state = !self.by_score.is_empty() || self.last_read != 0.0;
        self.by_value.clear();
        self.by_score.clear();
        self.last_read = 0.0;
        had_state
    }

    /// All events, newest first.
    pub fn fetch(&self) -> Vec<Event> {
        self.by_score
            .iter()
            .rev()
            .map(|k| Event::with_at(k.value.clone(), k.at))
            .collect()
    }

    /// `paginate`: a 1-indexed, `per_page`-wide window, newest first. An
    /// out-of-range page returns an empty slice rather than erroring.
    ///
    /// Advances `last_read` to the max `at` of the returned page unless
    /// `peek` is set. The watermark update happens before the slice is
    /// returned to the caller.
    pub fn paginate(&mut self, page: u32, per_page: u32, peek: bool) -> Vec<Event> {
        let start = (page.saturating_sub(1) as usize).saturating_mul(per_page as usize);
        let slice: Vec<Event> = self
            .by_score
            .iter()
            .rev()
            .skip(start)
            .take(per_page as usize)
            .map(|k| Event::with_at(k.value.clone(), k.at))
            .collect();

        if !peek {
            if let Some(newest) = slice.iter().map(Event::at).fold(None, |acc, at| {
                Some(acc.map_or(at, |m: f64| m.max(at)))
            }) {
                self.last_read = self.last_read.max(newest);
            }
        }

        slice
    }

    pub fn reset_last_read(&mut self, at: Option<f64>) -> f64 {
        let candidate = at.unwrap_or_else(now_secs);
        self.last_read = self.last_read.max(candidate);
        self.last_read
    }

    pub fn total_count(&self) -> u64 {
        self.by_score.len() as u64
    }

    pub fn unread_count(&self) -> u64 {
        self.by_score.iter().filter(|k| k.at > self.last_read).count() as u64
    }

    pub fn last_read(&self) -> f64 {
        self.last_read
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

fn now_secs() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}


#[cfg(test)]
mod invariant_properties {
    use super::*;
    use proptest::prelude::*;

    /// The size bound, dedup, ordering, and unread/total invariants hold
    /// after any sequence of `store` calls, for any max_size and any mix of
    /// duplicate/fresh values.
    proptest! {
        #[test]
        fn invariants_hold_after_arbitrary_stores(
            max_size in 1usize..8,
            ops in proptest::collection::vec((0u8..5, 0.0f64..100.0), 0..40),
        ) {
            let mut state = UserFeedState::new(max_size);
            for (value, at) in ops {
                state.store(Event::with_at(vec![value], at));
            }

            let fetched = state.fetch();

            prop_assert!(fetched.len() <= max_size);

            // unique by value
            let mut seen = std::collections::HashSet::new();
            for e in &fetched {
                prop_assert!(seen.insert(e.value().to_vec()));
            }

            // strictly non-increasing `at`
            for pair in fetched.windows(2) {
                prop_assert!(pair[0].at() >= pair[1].at());
            }

            let unread = state.unread_count();
            let total = state.total_count();
            prop_assert!(unread <= total);
        }
    }
}
