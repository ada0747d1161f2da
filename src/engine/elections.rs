use std::collections::BTreeMap;

use crate::engine::error::{EngineError, TransitionError, ValidationError};
use crate::id::IdGenerator;
use crate::model::{
    CandidacyId, CandidacyStatus, Election, ElectionCandidacy, ElectionId, ElectionPhase,
    PlayerId, PlayerProfile, Timestamp,
};

/// Registry of elections and candidacies, and the state machine over them.
///
/// Validation and recording are split so the resolver can place the filing-fee
/// debit between them while holding the relevant locks: `validate_*` never
/// mutates, `record_*` assumes validation already passed.
#[derive(Debug, Default)]
pub struct ElectionBook {
    elections: BTreeMap<ElectionId, Election>,
    candidacies: BTreeMap<CandidacyId, ElectionCandidacy>,
    by_election_player: BTreeMap<(ElectionId, PlayerId), CandidacyId>,
    id_gen: IdGenerator,
}

impl ElectionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an election created by the external lifecycle driver.
    /// Elections enter the book in `accepting_candidates`; anything already
    /// mid-lifecycle is rejected.
    pub fn register_election(&mut self, election: Election) -> Result<(), EngineError> {
        let id = election.id;
        if self.elections.contains_key(&id) {
            return Err(ValidationError::DuplicateElection(id).into());
        }
        if election.phase != ElectionPhase::AcceptingCandidates {
            return Err(ValidationError::WrongRegistrationPhase {
                election: id,
                phase: election.phase,
            }
            .into());
        }
        if election.filing_fee < 0 {
            return Err(ValidationError::NegativeFilingFee {
                fee: election.filing_fee,
            }
            .into());
        }
        self.elections.insert(id, election);
        Ok(())
    }

    pub fn election(&self, id: ElectionId) -> Option<&Election> {
        self.elections.get(&id)
    }

    pub fn candidacy(&self, id: CandidacyId) -> Option<&ElectionCandidacy> {
        self.candidacies.get(&id)
    }

    pub fn candidacy_for(
        &self,
        election_id: ElectionId,
        player_id: PlayerId,
    ) -> Option<&ElectionCandidacy> {
        self.by_election_player
            .get(&(election_id, player_id))
            .map(|id| &self.candidacies[id])
    }

    /// Check whether `profile` may file for `election_id` at `now`; returns
    /// the filing fee to debit. Checked in order: election exists, phase is
    /// accepting, deadline not passed, home region matches, party matches for
    /// partisan primaries, not already filed.
    pub fn validate_filing(
        &self,
        profile: &PlayerProfile,
        election_id: ElectionId,
        now: Timestamp,
    ) -> Result<i64, EngineError> {
        let Some(election) = self.elections.get(&election_id) else {
            return Err(ValidationError::UnknownElection(election_id).into());
        };
        if election.phase != ElectionPhase::AcceptingCandidates {
            return Err(TransitionError::NotAcceptingCandidates {
                election: election_id,
                phase: election.phase,
            }
            .into());
        }
        if now > election.filing_deadline {
            return Err(TransitionError::DeadlinePassed {
                election: election_id,
            }
            .into());
        }
        if profile.home_region != election.region {
            return Err(ValidationError::RegionMismatch {
                region: profile.home_region.clone(),
                required: election.region.clone(),
            }
            .into());
        }
        if let Some(required) = &election.party {
            if profile.party.as_deref() != Some(required.as_str()) {
                return Err(ValidationError::PartyMismatch {
                    required: required.clone(),
                }
                .into());
            }
        }
        if self
            .by_election_player
            .contains_key(&(election_id, profile.id))
        {
            return Err(ValidationError::AlreadyFiled {
                player: profile.id,
                election: election_id,
            }
            .into());
        }
        Ok(election.filing_fee)
    }

    /// Create the candidacy record after the fee was debited.
    ///
    /// # Panics
    /// Panics if the election is unknown or the player already filed; callers
    /// validate first and hold the lock across validate and record.
    pub fn record_filing(
        &mut self,
        election_id: ElectionId,
        player_id: PlayerId,
        fee_paid: i64,
        now: Timestamp,
    ) -> CandidacyId {
        let Some(election) = self.elections.get(&election_id) else {
            panic!("filing recorded against unknown {election_id}");
        };
        let status = CandidacyStatus::from_phase(election.phase);
        let id = CandidacyId(self.id_gen.next_id());
        let previous = self.by_election_player.insert((election_id, player_id), id);
        assert!(
            previous.is_none(),
            "{player_id} already filed for {election_id}"
        );
        self.candidacies.insert(
            id,
            ElectionCandidacy {
                id,
                election_id,
                player_id,
                status,
                fee_paid,
                filed_at: now,
            },
        );
        id
    }

    /// Check whether `player_id` may withdraw from `election_id` at `now`;
    /// returns the candidacy and the fee to refund. Withdrawal is legal only
    /// while the candidacy is still `accepting_candidates` and the filing
    /// deadline has not passed — anything else is an error, never a no-op.
    pub fn validate_withdrawal(
        &self,
        player_id: PlayerId,
        election_id: ElectionId,
        now: Timestamp,
    ) -> Result<(CandidacyId, i64), EngineError> {
        let Some(election) = self.elections.get(&election_id) else {
            return Err(ValidationError::UnknownElection(election_id).into());
        };
        let Some(&candidacy_id) = self.by_election_player.get(&(election_id, player_id)) else {
            return Err(ValidationError::NotFiled {
                player: player_id,
                election: election_id,
            }
            .into());
        };
        let candidacy = &self.candidacies[&candidacy_id];
        if candidacy.status != CandidacyStatus::AcceptingCandidates {
            return Err(TransitionError::WrongStatus {
                expected: CandidacyStatus::AcceptingCandidates,
                found: candidacy.status,
            }
            .into());
        }
        if now > election.filing_deadline {
            return Err(TransitionError::DeadlinePassed {
                election: election_id,
            }
            .into());
        }
        Ok((candidacy_id, candidacy.fee_paid))
    }

    /// Mark the candidacy withdrawn after the fee was refunded.
    ///
    /// # Panics
    /// Panics if the candidacy is unknown or not `accepting_candidates`.
    pub fn record_withdrawal(&mut self, candidacy_id: CandidacyId) {
        let Some(candidacy) = self.candidacies.get_mut(&candidacy_id) else {
            panic!("withdrawal recorded for unknown {candidacy_id}");
        };
        assert!(
            candidacy.status == CandidacyStatus::AcceptingCandidates,
            "withdrawal recorded for {} candidacy",
            candidacy.status
        );
        candidacy.status = CandidacyStatus::Withdrawn;
    }

    /// Advance an election's phase, forward only, and carry every
    /// non-withdrawn candidacy in it to the matching status.
    pub fn advance_election(
        &mut self,
        election_id: ElectionId,
        to: ElectionPhase,
    ) -> Result<(), EngineError> {
        let Some(election) = self.elections.get_mut(&election_id) else {
            return Err(ValidationError::UnknownElection(election_id).into());
        };
        if !election.phase.can_advance_to(to) {
            return Err(TransitionError::IllegalAdvance {
                election: election_id,
                from: election.phase,
                to,
            }
            .into());
        }
        election.phase = to;
        let status = CandidacyStatus::from_phase(to);
        for candidacy in self.candidacies.values_mut() {
            if candidacy.election_id == election_id
                && candidacy.status != CandidacyStatus::Withdrawn
            {
                candidacy.status = status;
            }
        }
        Ok(())
    }

    /// Find the candidacy an attack on `target` would hit: any candidacy of
    /// that player currently in `campaign_active`.
    pub fn check_attack_target(&self, target: PlayerId) -> Result<CandidacyId, EngineError> {
        let mut found: Option<&ElectionCandidacy> = None;
        for candidacy in self.candidacies.values() {
            if candidacy.player_id != target {
                continue;
            }
            if candidacy.status == CandidacyStatus::CampaignActive {
                return Ok(candidacy.id);
            }
            found = Some(candidacy);
        }
        match found {
            Some(candidacy) => Err(TransitionError::WrongStatus {
                expected: CandidacyStatus::CampaignActive,
                found: candidacy.status,
            }
            .into()),
            None => Err(ValidationError::TargetNotCandidate { player: target }.into()),
        }
    }

    /// Check that `candidacy_id` may receive support: it exists and its
    /// election is mid-campaign. Returns the candidate's player id.
    pub fn check_support_target(
        &self,
        candidacy_id: CandidacyId,
    ) -> Result<PlayerId, EngineError> {
        let Some(candidacy) = self.candidacies.get(&candidacy_id) else {
            return Err(ValidationError::UnknownCandidacy(candidacy_id).into());
        };
        if candidacy.status != CandidacyStatus::CampaignActive {
            return Err(TransitionError::WrongStatus {
                expected: CandidacyStatus::CampaignActive,
                found: candidacy.status,
            }
            .into());
        }
        Ok(candidacy.player_id)
    }

    /// Elections in id order.
    pub fn elections(&self) -> impl Iterator<Item = &Election> {
        self.elections.values()
    }

    /// Candidacies in id order.
    pub fn candidacies(&self) -> impl Iterator<Item = &ElectionCandidacy> {
        self.candidacies.values()
    }

    /// The id the next filing will be assigned.
    pub fn next_candidacy_id(&self) -> u64 {
        self.id_gen.peek()
    }

    /// Rebuild a book from persisted state. Inconsistent input — duplicate
    /// ids, candidacies against unknown elections, ids at or past the
    /// generator position — is a fatal error, not a panic: persisted state is
    /// external input.
    pub fn from_parts(
        elections: Vec<Election>,
        candidacies: Vec<ElectionCandidacy>,
        next_candidacy_id: u64,
    ) -> Result<Self, EngineError> {
        if next_candidacy_id == 0 {
            return Err(EngineError::System(
                "next candidacy id must be at least 1".to_string(),
            ));
        }
        let mut book = Self {
            elections: BTreeMap::new(),
            candidacies: BTreeMap::new(),
            by_election_player: BTreeMap::new(),
            id_gen: IdGenerator::starting_from(next_candidacy_id),
        };
        for election in elections {
            let id = election.id;
            if book.elections.insert(id, election).is_some() {
                return Err(EngineError::System(format!("duplicate {id} in snapshot")));
            }
        }
        for candidacy in candidacies {
            let id = candidacy.id;
            let election_id = candidacy.election_id;
            let player_id = candidacy.player_id;
            if !book.elections.contains_key(&election_id) {
                return Err(EngineError::System(format!(
                    "{id} references unknown {election_id}"
                )));
            }
            if id.0 >= next_candidacy_id {
                return Err(EngineError::System(format!(
                    "{id} at or past next candidacy id {next_candidacy_id}"
                )));
            }
            if book
                .by_election_player
                .insert((election_id, player_id), id)
                .is_some()
            {
                return Err(EngineError::System(format!(
                    "duplicate candidacy for {player_id} in {election_id}"
                )));
            }
            if book.candidacies.insert(id, candidacy).is_some() {
                return Err(EngineError::System(format!("duplicate {id} in snapshot")));
            }
        }
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEADLINE: Timestamp = Timestamp::from_millis(100_000);

    fn open_election(id: u64, region: &str, party: Option<&str>) -> Election {
        Election {
            id: ElectionId(id),
            name: format!("{region} Primary"),
            region: region.to_string(),
            party: party.map(str::to_string),
            filing_fee: 1_000,
            filing_deadline: DEADLINE,
            phase: ElectionPhase::AcceptingCandidates,
        }
    }

    fn profile(id: u64, region: &str, party: Option<&str>) -> PlayerProfile {
        PlayerProfile::new(PlayerId(id), &format!("Player {id}"), region, party)
    }

    fn at(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    fn book_with_election() -> ElectionBook {
        let mut book = ElectionBook::new();
        book.register_election(open_election(1, "OH", None)).unwrap();
        book
    }

    #[test]
    fn filing_happy_path_creates_candidacy() {
        let mut book = book_with_election();
        let filer = profile(10, "OH", Some("Unity"));

        let fee = book
            .validate_filing(&filer, ElectionId(1), at(500))
            .unwrap();
        assert_eq!(fee, 1_000);

        let id = book.record_filing(ElectionId(1), filer.id, fee, at(500));
        let candidacy = book.candidacy(id).unwrap();
        assert_eq!(candidacy.status, CandidacyStatus::AcceptingCandidates);
        assert_eq!(candidacy.fee_paid, 1_000);
        assert_eq!(candidacy.filed_at, at(500));
        assert_eq!(
            book.candidacy_for(ElectionId(1), filer.id).unwrap().id,
            id
        );
    }

    #[test]
    fn negative_filing_fee_rejected_at_registration() {
        let mut book = ElectionBook::new();
        let mut election = open_election(1, "OH", None);
        election.filing_fee = -5;
        let err = book.register_election(election).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(ValidationError::NegativeFilingFee { fee: -5 })
        );
    }

    #[test]
    fn mid_lifecycle_election_rejected_at_registration() {
        let mut book = ElectionBook::new();
        let mut election = open_election(1, "OH", None);
        election.phase = ElectionPhase::CampaignActive;
        let err = book.register_election(election).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(ValidationError::WrongRegistrationPhase {
                election: ElectionId(1),
                phase: ElectionPhase::CampaignActive,
            })
        );
        // The rejected election never made it into the book.
        assert!(book.election(ElectionId(1)).is_none());
    }

    #[test]
    fn filing_rejects_unknown_election() {
        let book = ElectionBook::new();
        let err = book
            .validate_filing(&profile(10, "OH", None), ElectionId(9), at(0))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(ValidationError::UnknownElection(ElectionId(9)))
        );
    }

    #[test]
    fn filing_allowed_at_the_deadline_but_not_after() {
        let mut book = book_with_election();
        let filer = profile(10, "OH", None);

        assert!(book.validate_filing(&filer, ElectionId(1), DEADLINE).is_ok());

        let err = book
            .validate_filing(&filer, ElectionId(1), at(100_001))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidTransition(TransitionError::DeadlinePassed {
                election: ElectionId(1)
            })
        );
    }

    #[test]
    fn filing_rejects_wrong_region() {
        let book = book_with_election();
        let err = book
            .validate_filing(&profile(10, "NV", None), ElectionId(1), at(0))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::RegionMismatch { .. })
        ));
    }

    #[test]
    fn partisan_primary_requires_matching_party() {
        let mut book = ElectionBook::new();
        book.register_election(open_election(2, "OH", Some("Unity")))
            .unwrap();

        // Wrong party.
        let err = book
            .validate_filing(&profile(10, "OH", Some("Reform")), ElectionId(2), at(0))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::PartyMismatch { .. })
        ));

        // Independents never match a partisan primary.
        let err = book
            .validate_filing(&profile(11, "OH", None), ElectionId(2), at(0))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::PartyMismatch { .. })
        ));

        assert!(
            book.validate_filing(&profile(12, "OH", Some("Unity")), ElectionId(2), at(0))
                .is_ok()
        );
    }

    #[test]
    fn open_election_accepts_any_party() {
        let book = book_with_election();
        assert!(
            book.validate_filing(&profile(10, "OH", Some("Unity")), ElectionId(1), at(0))
                .is_ok()
        );
        assert!(
            book.validate_filing(&profile(11, "OH", None), ElectionId(1), at(0))
                .is_ok()
        );
    }

    #[test]
    fn duplicate_filing_rejected() {
        let mut book = book_with_election();
        let filer = profile(10, "OH", None);
        book.record_filing(ElectionId(1), filer.id, 1_000, at(0));

        let err = book
            .validate_filing(&filer, ElectionId(1), at(1))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(ValidationError::AlreadyFiled {
                player: filer.id,
                election: ElectionId(1)
            })
        );
    }

    #[test]
    fn withdrawal_is_terminal_refiling_rejected() {
        let mut book = book_with_election();
        let filer = profile(10, "OH", None);
        let id = book.record_filing(ElectionId(1), filer.id, 1_000, at(0));
        book.record_withdrawal(id);

        let err = book
            .validate_filing(&filer, ElectionId(1), at(1))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::AlreadyFiled { .. })
        ));
    }

    #[test]
    fn filing_rejected_once_campaign_is_active() {
        let mut book = book_with_election();
        book.advance_election(ElectionId(1), ElectionPhase::CampaignActive)
            .unwrap();

        let err = book
            .validate_filing(&profile(10, "OH", None), ElectionId(1), at(0))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidTransition(TransitionError::NotAcceptingCandidates {
                election: ElectionId(1),
                phase: ElectionPhase::CampaignActive
            })
        );
    }

    #[test]
    fn withdrawal_happy_path_returns_fee() {
        let mut book = book_with_election();
        let filer = profile(10, "OH", None);
        let id = book.record_filing(ElectionId(1), filer.id, 1_000, at(0));

        let (candidacy_id, fee) = book
            .validate_withdrawal(filer.id, ElectionId(1), at(50_000))
            .unwrap();
        assert_eq!(candidacy_id, id);
        assert_eq!(fee, 1_000);

        book.record_withdrawal(candidacy_id);
        assert_eq!(
            book.candidacy(id).unwrap().status,
            CandidacyStatus::Withdrawn
        );
    }

    #[test]
    fn withdrawal_rejected_after_deadline() {
        let mut book = book_with_election();
        let filer = profile(10, "OH", None);
        book.record_filing(ElectionId(1), filer.id, 1_000, at(0));

        let err = book
            .validate_withdrawal(filer.id, ElectionId(1), at(100_001))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidTransition(TransitionError::DeadlinePassed {
                election: ElectionId(1)
            })
        );
    }

    #[test]
    fn withdrawal_rejected_when_not_accepting() {
        let mut book = book_with_election();
        let filer = profile(10, "OH", None);
        book.record_filing(ElectionId(1), filer.id, 1_000, at(0));
        book.advance_election(ElectionId(1), ElectionPhase::CampaignActive)
            .unwrap();

        let err = book
            .validate_withdrawal(filer.id, ElectionId(1), at(1))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidTransition(TransitionError::WrongStatus {
                expected: CandidacyStatus::AcceptingCandidates,
                found: CandidacyStatus::CampaignActive
            })
        );

        // Already-withdrawn candidacies are rejected the same way.
        let mut book = book_with_election();
        let id2 = book.record_filing(ElectionId(1), filer.id, 1_000, at(0));
        book.record_withdrawal(id2);
        let err = book
            .validate_withdrawal(filer.id, ElectionId(1), at(1))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidTransition(TransitionError::WrongStatus {
                found: CandidacyStatus::Withdrawn,
                ..
            })
        ));
    }

    #[test]
    fn withdrawal_rejected_when_never_filed() {
        let book = book_with_election();
        let err = book
            .validate_withdrawal(PlayerId(10), ElectionId(1), at(0))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(ValidationError::NotFiled {
                player: PlayerId(10),
                election: ElectionId(1)
            })
        );
    }

    #[test]
    fn advance_carries_candidacies_except_withdrawn() {
        let mut book = book_with_election();
        let a = book.record_filing(ElectionId(1), PlayerId(10), 1_000, at(0));
        let b = book.record_filing(ElectionId(1), PlayerId(11), 1_000, at(0));
        book.record_withdrawal(b);

        book.advance_election(ElectionId(1), ElectionPhase::CampaignActive)
            .unwrap();
        assert_eq!(
            book.candidacy(a).unwrap().status,
            CandidacyStatus::CampaignActive
        );
        assert_eq!(
            book.candidacy(b).unwrap().status,
            CandidacyStatus::Withdrawn
        );

        book.advance_election(ElectionId(1), ElectionPhase::Closed)
            .unwrap();
        assert_eq!(book.candidacy(a).unwrap().status, CandidacyStatus::Closed);
        assert_eq!(
            book.candidacy(b).unwrap().status,
            CandidacyStatus::Withdrawn
        );
    }

    #[test]
    fn advance_rejects_backwards_and_skipping() {
        let mut book = book_with_election();

        let err = book
            .advance_election(ElectionId(1), ElectionPhase::Closed)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidTransition(TransitionError::IllegalAdvance { .. })
        ));

        book.advance_election(ElectionId(1), ElectionPhase::CampaignActive)
            .unwrap();
        let err = book
            .advance_election(ElectionId(1), ElectionPhase::AcceptingCandidates)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidTransition(TransitionError::IllegalAdvance { .. })
        ));
    }

    #[test]
    fn advance_does_not_touch_other_elections() {
        let mut book = book_with_election();
        book.register_election(open_election(2, "NV", None)).unwrap();
        let other = book.record_filing(ElectionId(2), PlayerId(20), 500, at(0));

        book.advance_election(ElectionId(1), ElectionPhase::CampaignActive)
            .unwrap();
        assert_eq!(
            book.candidacy(other).unwrap().status,
            CandidacyStatus::AcceptingCandidates
        );
        assert_eq!(
            book.election(ElectionId(2)).unwrap().phase,
            ElectionPhase::AcceptingCandidates
        );
    }

    #[test]
    fn attack_requires_campaign_active_candidacy() {
        let mut book = book_with_election();

        // No candidacy at all.
        let err = book.check_attack_target(PlayerId(10)).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(ValidationError::TargetNotCandidate {
                player: PlayerId(10)
            })
        );

        // Filed but still accepting.
        let id = book.record_filing(ElectionId(1), PlayerId(10), 1_000, at(0));
        let err = book.check_attack_target(PlayerId(10)).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidTransition(TransitionError::WrongStatus {
                expected: CandidacyStatus::CampaignActive,
                found: CandidacyStatus::AcceptingCandidates
            })
        );

        // Mid-campaign: legal.
        book.advance_election(ElectionId(1), ElectionPhase::CampaignActive)
            .unwrap();
        assert_eq!(book.check_attack_target(PlayerId(10)).unwrap(), id);

        // Closed: rejected again.
        book.advance_election(ElectionId(1), ElectionPhase::Closed)
            .unwrap();
        let err = book.check_attack_target(PlayerId(10)).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidTransition(TransitionError::WrongStatus {
                expected: CandidacyStatus::CampaignActive,
                found: CandidacyStatus::Closed
            })
        );
    }

    #[test]
    fn support_target_checks_status() {
        let mut book = book_with_election();
        let id = book.record_filing(ElectionId(1), PlayerId(10), 1_000, at(0));

        let err = book.check_support_target(CandidacyId(99)).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(ValidationError::UnknownCandidacy(CandidacyId(99)))
        );

        let err = book.check_support_target(id).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidTransition(TransitionError::WrongStatus { .. })
        ));

        book.advance_election(ElectionId(1), ElectionPhase::CampaignActive)
            .unwrap();
        assert_eq!(book.check_support_target(id).unwrap(), PlayerId(10));
    }

    #[test]
    fn from_parts_round_trips() {
        let mut book = book_with_election();
        book.register_election(open_election(2, "NV", Some("Unity")))
            .unwrap();
        book.record_filing(ElectionId(1), PlayerId(10), 1_000, at(5));
        let b = book.record_filing(ElectionId(1), PlayerId(11), 1_000, at(6));
        book.record_withdrawal(b);

        let elections: Vec<Election> = book.elections().cloned().collect();
        let candidacies: Vec<ElectionCandidacy> = book.candidacies().cloned().collect();
        let rebuilt =
            ElectionBook::from_parts(elections, candidacies, book.next_candidacy_id()).unwrap();

        assert_eq!(rebuilt.next_candidacy_id(), 3);
        assert_eq!(
            rebuilt.candidacy(b).unwrap().status,
            CandidacyStatus::Withdrawn
        );
        assert_eq!(
            rebuilt.candidacy_for(ElectionId(1), PlayerId(10)).unwrap().fee_paid,
            1_000
        );
        // The rebuilt book keeps assigning fresh ids.
        let mut rebuilt = rebuilt;
        let next = rebuilt.record_filing(ElectionId(2), PlayerId(12), 500, at(7));
        assert_eq!(next, CandidacyId(3));
    }

    #[test]
    fn from_parts_rejects_inconsistent_snapshots() {
        let orphan = ElectionCandidacy {
            id: CandidacyId(1),
            election_id: ElectionId(9),
            player_id: PlayerId(10),
            status: CandidacyStatus::AcceptingCandidates,
            fee_paid: 0,
            filed_at: at(0),
        };
        let err = ElectionBook::from_parts(vec![], vec![orphan], 2).unwrap_err();
        assert!(matches!(err, EngineError::System(_)));

        let err = ElectionBook::from_parts(vec![], vec![], 0).unwrap_err();
        assert!(matches!(err, EngineError::System(_)));

        let stale = ElectionCandidacy {
            id: CandidacyId(5),
            election_id: ElectionId(1),
            player_id: PlayerId(10),
            status: CandidacyStatus::AcceptingCandidates,
            fee_paid: 0,
            filed_at: at(0),
        };
        let err =
            ElectionBook::from_parts(vec![open_election(1, "OH", None)], vec![stale], 3)
                .unwrap_err();
        assert!(matches!(err, EngineError::System(_)));
    }

    #[test]
    #[should_panic(expected = "unknown election")]
    fn record_filing_panics_on_unknown_election() {
        let mut book = ElectionBook::new();
        book.record_filing(ElectionId(9), PlayerId(1), 0, at(0));
    }

    #[test]
    #[should_panic(expected = "withdrawal recorded for campaign_active")]
    fn record_withdrawal_panics_on_wrong_status() {
        let mut book = book_with_election();
        let id = book.record_filing(ElectionId(1), PlayerId(10), 1_000, at(0));
        book.advance_election(ElectionId(1), ElectionPhase::CampaignActive)
            .unwrap();
        book.record_withdrawal(id);
    }
}
