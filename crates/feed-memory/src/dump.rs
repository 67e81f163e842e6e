//! The flat dump/restore fixture format: a mapping from `user_id` to
//! `{events: [{value, at}...], last_read}`.

use feed_core::{Event, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::state::UserFeedState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct EventDump {
    value: Vec<u8>,
    at: f64,
}

/// One user's exported feed state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserDump {
    events: Vec<EventDump>,
    last_read: f64,
}

impl UserDump {
    pub(crate) fn from_state(state: &UserFeedState) -> Self {
        Self {
            events: state
                .fetch()
                .into_iter()
                .map(|e| EventDump {
                    value: e.value().to_vec(),
                    at: e.at(),
                })
                .collect(),
            last_read: state.last_read(),
        }
    }

    pub(crate) fn into_state(self, max_size: usize) -> UserFeedState {
        let mut state = UserFeedState::new(max_size);
        for e in self.events {
            state.store(Event::with_at(e.value, e.at));
        }
        state.reset_last_read(Some(self.last_read));
        state
    }
}

/// Serialize a dump map to the flat JSON fixture format.
pub fn to_json(dump: &HashMap<UserId, UserDump>) -> Result<String, serde_json::Error> {
    serde_json::to_string(dump)
}

/// Parse a dump map from the flat JSON fixture format.
pub fn from_json(raw: &str) -> Result<HashMap<UserId, UserDump>, serde_json::Error> {
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let mut state = UserFeedState::new(10);
        state.store(Event::with_at("a", 1.0));
        state.store(Event::with_at("b", 2.0));
        state.reset_last_read(Some(1.5));

        let mut dump = HashMap::new();
        dump.insert(UserId::new("u1").unwrap(), UserDump::from_state(&state));

        let json = to_json(&dump).unwrap();
        let restored = from_json(&json).unwrap();

        let restored_dump = &restored[&UserId::new("u1").unwrap()];
        assert_eq!(restored_dump.last_read, 1.5);
        assert_eq!(restored_dump.events.len(), 2);
    }
}
