use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::{CandidacyId, ElectionId, PlayerId};
use super::timestamp::Timestamp;

/// Lifecycle phase of an election. Phases advance strictly forward:
/// `accepting_candidates → campaign_active → closed`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionPhase {
    AcceptingCandidates,
    CampaignActive,
    Closed,
}

impl ElectionPhase {
    /// Return the serde string for this variant (for messages and Postgres COPY).
    pub fn as_str(&self) -> &'static str {
        match self {
            ElectionPhase::AcceptingCandidates => "accepting_candidates",
            ElectionPhase::CampaignActive => "campaign_active",
            ElectionPhase::Closed => "closed",
        }
    }

    /// Whether the lifecycle may move from `self` to `next`. Only the two
    /// forward steps are legal; there is no way back and no skipping ahead.
    pub fn can_advance_to(self, next: ElectionPhase) -> bool {
        matches!(
            (self, next),
            (
                ElectionPhase::AcceptingCandidates,
                ElectionPhase::CampaignActive
            ) | (ElectionPhase::CampaignActive, ElectionPhase::Closed)
        )
    }
}

impl fmt::Display for ElectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one player's candidacy. Mirrors the owning election's phase,
/// except `withdrawn`, which a timely voluntary withdrawal sets and nothing
/// ever changes again.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidacyStatus {
    AcceptingCandidates,
    CampaignActive,
    Closed,
    Withdrawn,
}

impl CandidacyStatus {
    /// Return the serde string for this variant (for messages and Postgres COPY).
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidacyStatus::AcceptingCandidates => "accepting_candidates",
            CandidacyStatus::CampaignActive => "campaign_active",
            CandidacyStatus::Closed => "closed",
            CandidacyStatus::Withdrawn => "withdrawn",
        }
    }

    /// Terminal statuses never change, and the player can never re-file.
    pub fn is_terminal(self) -> bool {
        matches!(self, CandidacyStatus::Closed | CandidacyStatus::Withdrawn)
    }

    pub fn from_phase(phase: ElectionPhase) -> Self {
        match phase {
            ElectionPhase::AcceptingCandidates => CandidacyStatus::AcceptingCandidates,
            ElectionPhase::CampaignActive => CandidacyStatus::CampaignActive,
            ElectionPhase::Closed => CandidacyStatus::Closed,
        }
    }
}

impl fmt::Display for CandidacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An election registered with the engine by the external lifecycle driver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Election {
    pub id: ElectionId,
    pub name: String,
    /// Region a filer's home region must match.
    pub region: String,
    /// Party restriction for partisan primaries; `None` means open filing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    pub filing_fee: i64,
    pub filing_deadline: Timestamp,
    pub phase: ElectionPhase,
}

/// One player's registered participation in one election.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElectionCandidacy {
    pub id: CandidacyId,
    pub election_id: ElectionId,
    pub player_id: PlayerId,
    pub status: CandidacyStatus,
    /// Fee debited at filing; refunded in full on timely withdrawal.
    pub fee_paid: i64,
    pub filed_at: Timestamp,
}
