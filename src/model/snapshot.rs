use serde::{Deserialize, Serialize};

use super::cooldown::CooldownTracker;
use super::election::{Election, ElectionCandidacy};
use super::ids::PlayerId;
use super::player::PlayerProfile;
use super::resources::ResourceLedger;
use super::timestamp::Timestamp;

/// One player's engine state as captured in a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub profile: PlayerProfile,
    pub ledger: ResourceLedger,
    #[serde(default)]
    pub cooldowns: CooldownTracker,
}

/// A cooldown record flattened to one row, for Postgres COPY and JSONL export.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CooldownRow {
    pub player_id: PlayerId,
    pub action_id: String,
    pub last_used: Timestamp,
}

/// Serializable, self-contained copy of all mutable engine state. Produced by
/// the resolver for the storage adapter and the JSONL flush; consumed to
/// reconstruct an engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub players: Vec<PlayerRecord>,
    pub elections: Vec<Election>,
    pub candidacies: Vec<ElectionCandidacy>,
    /// Next candidacy id the engine's generator will assign.
    pub next_candidacy_id: u64,
}

impl EngineSnapshot {
    /// Cooldown records across all players, flattened in (player, action)
    /// order.
    pub fn cooldown_rows(&self) -> Vec<CooldownRow> {
        let mut rows = Vec::new();
        for player in &self.players {
            for (action_id, last_used) in player.cooldowns.iter() {
                rows.push(CooldownRow {
                    player_id: player.profile.id,
                    action_id: action_id.to_string(),
                    last_used,
                });
            }
        }
        rows
    }
}
