pub mod catalog;
pub mod cooldown;
pub mod election;
pub mod ids;
pub mod player;
pub mod resources;
pub mod snapshot;
pub mod timestamp;

pub use catalog::{
    ATTACK_ACTION, ActionCatalog, ActionCategory, ActionDefinition, CatalogError, CostScaling,
    EffectSpec, OutcomeBranch, SPEECH_ACTION, SUPPORT_ACTION, StatRequirement,
};
pub use cooldown::CooldownTracker;
pub use election::{CandidacyStatus, Election, ElectionCandidacy, ElectionPhase};
pub use ids::{CandidacyId, ElectionId, PlayerId};
pub use player::PlayerProfile;
pub use resources::{ActionCost, ResourceKind, ResourceLedger, Shortfall, StatDelta, StatsSnapshot};
pub use snapshot::{CooldownRow, EngineSnapshot, PlayerRecord};
pub use timestamp::Timestamp;
