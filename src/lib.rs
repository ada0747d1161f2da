pub mod db;
pub mod engine;
pub mod flush;
pub mod id;
pub mod model;

pub use engine::{
    ActionReport, ActionResolver, AttackReport, Clock, EngineConfig, EngineError, FilingReport,
    ManualClock, SupportReport, SystemClock, TransitionError, ValidationError, WithdrawalReport,
};
pub use id::IdGenerator;
pub use model::{
    ActionCatalog, ActionCost, CandidacyId, CandidacyStatus, Election, ElectionCandidacy,
    ElectionId, ElectionPhase, EngineSnapshot, PlayerId, PlayerProfile, ResourceKind,
    ResourceLedger, StatsSnapshot, Timestamp,
};
