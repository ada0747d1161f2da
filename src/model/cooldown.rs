use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::timestamp::Timestamp;

/// Last-execution timestamps for one player's cooldown-gated actions.
///
/// Records are created on first successful use, overwritten on each success,
/// and never independently deleted. The tracker lives inside the player's
/// exclusive region, so check-then-record races cannot occur between two
/// requests for the same player.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CooldownTracker {
    records: BTreeMap<String, Timestamp>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a tracker from persisted records.
    pub fn from_records(records: impl IntoIterator<Item = (String, Timestamp)>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    /// Whether the action can run at `now` given its configured window.
    /// A zero-length window is always available.
    pub fn is_available(&self, action_id: &str, cooldown_ms: u64, now: Timestamp) -> bool {
        if cooldown_ms == 0 {
            return true;
        }
        match self.records.get(action_id) {
            None => true,
            Some(&last) => now.millis_since(last) >= cooldown_ms,
        }
    }

    /// Milliseconds until the action becomes available again; zero when it is
    /// available now.
    pub fn remaining_millis(&self, action_id: &str, cooldown_ms: u64, now: Timestamp) -> u64 {
        if cooldown_ms == 0 {
            return 0;
        }
        match self.records.get(action_id) {
            None => 0,
            Some(&last) => cooldown_ms.saturating_sub(now.millis_since(last)),
        }
    }

    /// Record a successful execution at `now`.
    pub fn record(&mut self, action_id: &str, now: Timestamp) {
        self.records.insert(action_id.to_string(), now);
    }

    pub fn last_used(&self, action_id: &str) -> Option<Timestamp> {
        self.records.get(action_id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in action-id order, for persistence and export.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Timestamp)> {
        self.records.iter().map(|(id, &ts)| (id.as_str(), ts))
    }
}
