use thiserror::Error;

use crate::model::{
    ActionCategory, CandidacyId, CandidacyStatus, ElectionId, ElectionPhase, PlayerId,
    ResourceKind, Shortfall,
};

/// Everything a request can fail with. Every variant except [`System`]
/// rejects the request before any mutation; no variant ever leaves a partial
/// resource mutation behind.
///
/// [`System`]: EngineError::System
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// The request itself is malformed: unknown ids, wrong category,
    /// self-targeting, wrong party or region, duplicate filing.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A resource or eligibility stat fell short. Carries which resource and
    /// how much more is needed.
    #[error("insufficient {resource}: need {required}, have {available}")]
    Insufficient {
        resource: ResourceKind,
        required: f64,
        available: f64,
    },

    /// The action's cooldown window has not elapsed.
    #[error("`{action}` is on cooldown for another {remaining_ms}ms")]
    CooldownActive { action: String, remaining_ms: u64 },

    /// The candidacy state machine forbids the requested step.
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    /// Bounded lock acquisition timed out. Transient: nothing was mutated and
    /// the request is safe to retry.
    #[error("{player} is busy; retry")]
    Busy { player: PlayerId },

    /// Fatal, non-recoverable condition (corrupted state, poisoned lock).
    /// Never retried automatically.
    #[error("engine failure: {0}")]
    System(String),
}

impl EngineError {
    /// Only busy results are safe to retry; everything else is either a
    /// definite rejection or fatal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Busy { .. })
    }

    pub(crate) fn from_shortfall(shortfall: Shortfall) -> Self {
        EngineError::Insufficient {
            resource: shortfall.resource,
            required: shortfall.required,
            available: shortfall.available,
        }
    }
}

/// Malformed-request rejections, raised before any state is read for
/// mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    #[error("unknown {0}")]
    UnknownPlayer(PlayerId),
    #[error("{0} is already registered")]
    DuplicatePlayer(PlayerId),
    #[error("unknown {0}")]
    UnknownElection(ElectionId),
    #[error("{0} is already registered")]
    DuplicateElection(ElectionId),
    #[error("filing fee must be non-negative, got {fee}")]
    NegativeFilingFee { fee: i64 },
    #[error("{election} must be registered in accepting_candidates, got {phase}")]
    WrongRegistrationPhase {
        election: ElectionId,
        phase: ElectionPhase,
    },
    #[error("unknown {0}")]
    UnknownCandidacy(CandidacyId),
    #[error("`{action}` is a {actual} action, not {expected}")]
    WrongCategory {
        action: String,
        expected: ActionCategory,
        actual: ActionCategory,
    },
    #[error("players cannot target themselves")]
    SelfTarget,
    #[error("{player} holds no candidacy in any election")]
    TargetNotCandidate { player: PlayerId },
    #[error("home region `{region}` does not match election region `{required}`")]
    RegionMismatch { region: String, required: String },
    #[error("filing requires membership in party `{required}`")]
    PartyMismatch { required: String },
    #[error("{player} already filed for {election}")]
    AlreadyFiled {
        player: PlayerId,
        election: ElectionId,
    },
    #[error("{player} has not filed for {election}")]
    NotFiled {
        player: PlayerId,
        election: ElectionId,
    },
}

/// Candidacy/election state-machine rejections: wrong status, passed
/// deadlines, or an illegal phase advance.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("{election} is {phase}, not accepting candidates")]
    NotAcceptingCandidates {
        election: ElectionId,
        phase: ElectionPhase,
    },
    #[error("filing deadline for {election} has passed")]
    DeadlinePassed { election: ElectionId },
    #[error("candidacy is {found}; expected {expected}")]
    WrongStatus {
        expected: CandidacyStatus,
        found: CandidacyStatus,
    },
    #[error("{election} cannot move from {from} to {to}")]
    IllegalAdvance {
        election: ElectionId,
        from: ElectionPhase,
        to: ElectionPhase,
    },
}
