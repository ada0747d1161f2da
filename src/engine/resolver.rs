use std::sync::{Arc, Mutex, MutexGuard};

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde_json::Value;

use crate::engine::arena::{LedgerArena, PlayerState, lock_bounded, lock_pair};
use crate::engine::clock::Clock;
use crate::engine::config::EngineConfig;
use crate::engine::cost::compute_cost;
use crate::engine::effects;
use crate::engine::elections::ElectionBook;
use crate::engine::error::{EngineError, ValidationError};
use crate::model::{
    ATTACK_ACTION, ActionCatalog, ActionCategory, ActionCost, ActionDefinition, CandidacyId,
    Election, ElectionCandidacy, ElectionId, ElectionPhase, EngineSnapshot, PlayerId,
    PlayerProfile, PlayerRecord, ResourceLedger, SPEECH_ACTION, SUPPORT_ACTION, StatDelta,
    StatsSnapshot, Timestamp,
};

/// Result of a successful self-targeted action.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionReport {
    /// Catalog id of the action that resolved.
    pub action: String,
    /// Outcome branch label for probabilistic actions.
    pub outcome: Option<String>,
    pub message: String,
    /// What the action actually cost after progressive scaling.
    pub cost: ActionCost,
    pub stats: StatsSnapshot,
}

/// Result of a successful attack.
#[derive(Clone, Debug, PartialEq)]
pub struct AttackReport {
    pub new_funds: i64,
    pub new_action_points: u32,
    /// Signed change to the target's approval, after clamping. Zero when the
    /// attack backfired onto the actor.
    pub target_approval_delta: f64,
    pub outcome: Option<String>,
    pub message: String,
}

/// Result of a successful support action.
#[derive(Clone, Debug, PartialEq)]
pub struct SupportReport {
    pub new_action_points: u32,
    pub new_political_capital: u32,
    pub message: String,
}

/// Result of a successful election filing.
#[derive(Clone, Debug, PartialEq)]
pub struct FilingReport {
    pub candidacy: CandidacyId,
    pub fee_paid: i64,
    pub new_funds: i64,
}

/// Result of a successful withdrawal.
#[derive(Clone, Debug, PartialEq)]
pub struct WithdrawalReport {
    pub candidacy: CandidacyId,
    pub refund: i64,
    pub new_funds: i64,
}

/// Resolves player requests against the catalog, the ledger arena, and the
/// election book.
///
/// Every action runs the same pipeline: definition lookup, eligibility gates,
/// cooldown, target legality, progressive cost from the live ledger, atomic
/// debit, effect application, snapshot. A failure anywhere before the debit
/// leaves every ledger untouched.
///
/// Lock discipline: ledger locks first (pairs in ascending player id), then
/// the election book, then the rng. No lock is held while acquiring one that
/// comes earlier in the order.
pub struct ActionResolver {
    catalog: Arc<ActionCatalog>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    arena: LedgerArena,
    elections: Mutex<ElectionBook>,
    rng: Mutex<SmallRng>,
}

impl ActionResolver {
    pub fn new(catalog: ActionCatalog, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let rng = SmallRng::seed_from_u64(config.rng_seed);
        Self {
            catalog: Arc::new(catalog),
            config,
            clock,
            arena: LedgerArena::new(),
            elections: Mutex::new(ElectionBook::new()),
            rng: Mutex::new(rng),
        }
    }

    /// Reconstruct an engine from persisted state. Inconsistent snapshots are
    /// fatal errors, never partial restores.
    pub fn from_snapshot(
        catalog: ActionCatalog,
        snapshot: EngineSnapshot,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EngineError> {
        let arena = LedgerArena::new();
        for record in snapshot.players {
            let id = record.profile.id;
            arena
                .admit(PlayerState {
                    profile: record.profile,
                    ledger: record.ledger,
                    cooldowns: record.cooldowns,
                })
                .map_err(|_| EngineError::System(format!("duplicate {id} in snapshot")))?;
        }
        let book = ElectionBook::from_parts(
            snapshot.elections,
            snapshot.candidacies,
            snapshot.next_candidacy_id,
        )?;
        for candidacy in book.candidacies() {
            if arena.handle(candidacy.player_id).is_err() {
                return Err(EngineError::System(format!(
                    "{} references unknown {}",
                    candidacy.id, candidacy.player_id
                )));
            }
        }
        let rng = SmallRng::seed_from_u64(config.rng_seed);
        Ok(Self {
            catalog: Arc::new(catalog),
            config,
            clock,
            arena,
            elections: Mutex::new(book),
            rng: Mutex::new(rng),
        })
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    /// Admit a new player with a starting ledger.
    pub fn register_player(
        &self,
        profile: PlayerProfile,
        ledger: ResourceLedger,
    ) -> Result<(), EngineError> {
        self.arena.admit(PlayerState::new(profile, ledger))
    }

    pub fn register_election(&self, election: Election) -> Result<(), EngineError> {
        self.book()?.register_election(election)
    }

    /// Advance an election's phase, forward only.
    pub fn advance_election(
        &self,
        election: ElectionId,
        to: ElectionPhase,
    ) -> Result<(), EngineError> {
        self.book()?.advance_election(election, to)?;
        tracing::debug!("{election} advanced to {to}");
        Ok(())
    }

    /// Run a fundraising action from the catalog.
    pub fn fundraise(
        &self,
        player: PlayerId,
        fundraising_type: &str,
    ) -> Result<ActionReport, EngineError> {
        self.perform_self_action(player, fundraising_type, ActionCategory::Fundraising, None)
    }

    /// Run the configured speech action.
    pub fn give_speech(&self, player: PlayerId) -> Result<ActionReport, EngineError> {
        self.perform_self_action(player, SPEECH_ACTION, ActionCategory::Speech, None)
    }

    /// Run a campaign operation from the catalog. `params` is free-form
    /// request metadata, echoed into the outcome message; it never feeds cost
    /// or effect computation.
    pub fn run_campaign_operation(
        &self,
        player: PlayerId,
        operation_type: &str,
        params: &Value,
    ) -> Result<ActionReport, EngineError> {
        self.perform_self_action(
            player,
            operation_type,
            ActionCategory::CampaignOperation,
            Some(params),
        )
    }

    /// Attack another player's active candidacy. On success the target's
    /// approval drops; on a backfire the penalty lands on the actor instead.
    /// Costs are consumed either way.
    pub fn attack(&self, player: PlayerId, target: PlayerId) -> Result<AttackReport, EngineError> {
        if player == target {
            return Err(ValidationError::SelfTarget.into());
        }
        let Some(def) = self.catalog.get(ATTACK_ACTION) else {
            return Err(ValidationError::UnknownAction(ATTACK_ACTION.to_string()).into());
        };
        let actor_handle = self.arena.handle(player)?;
        let target_handle = self.arena.handle(target)?;
        let now = self.clock.now();
        let (mut actor_state, mut target_state) = lock_pair(
            &actor_handle,
            player,
            &target_handle,
            target,
            self.config.lock_timeout,
            self.config.lock_retry_interval,
        )?;
        check_gates(&actor_state, def, now)?;
        let candidacy = self.book()?.check_attack_target(target)?;
        debit_cost(&mut actor_state, def)?;
        let approval_before = target_state.ledger.approval();
        let outcome = effects::apply(
            &def.effect,
            &mut *self.rng()?,
            &mut actor_state.ledger,
            Some(&mut target_state.ledger),
        );
        actor_state.cooldowns.record(&def.id, now);
        let target_approval_delta = target_state.ledger.approval() - approval_before;
        let stats = actor_state.ledger.snapshot();
        drop(target_state);
        drop(actor_state);

        tracing::debug!("{player} attacked {target} ({candidacy}): {}", outcome.message);
        Ok(AttackReport {
            new_funds: stats.funds,
            new_action_points: stats.action_points,
            target_approval_delta,
            outcome: outcome.label,
            message: outcome.message,
        })
    }

    /// Support another player's active candidacy.
    pub fn support(
        &self,
        player: PlayerId,
        candidacy_id: CandidacyId,
    ) -> Result<SupportReport, EngineError> {
        let Some(def) = self.catalog.get(SUPPORT_ACTION) else {
            return Err(ValidationError::UnknownAction(SUPPORT_ACTION.to_string()).into());
        };
        // Peek the candidate before taking any ledger lock. The binding from
        // candidacy to player is immutable; status is re-checked under lock.
        let candidate = self.book()?.check_support_target(candidacy_id)?;
        if candidate == player {
            return Err(ValidationError::SelfTarget.into());
        }
        let actor_handle = self.arena.handle(player)?;
        let target_handle = self.arena.handle(candidate)?;
        let now = self.clock.now();
        let (mut actor_state, mut target_state) = lock_pair(
            &actor_handle,
            player,
            &target_handle,
            candidate,
            self.config.lock_timeout,
            self.config.lock_retry_interval,
        )?;
        check_gates(&actor_state, def, now)?;
        self.book()?.check_support_target(candidacy_id)?;
        debit_cost(&mut actor_state, def)?;
        let outcome = effects::apply(
            &def.effect,
            &mut *self.rng()?,
            &mut actor_state.ledger,
            Some(&mut target_state.ledger),
        );
        actor_state.cooldowns.record(&def.id, now);
        let stats = actor_state.ledger.snapshot();
        drop(target_state);
        drop(actor_state);

        tracing::debug!("{player} supported {candidacy_id}: {}", outcome.message);
        Ok(SupportReport {
            new_action_points: stats.action_points,
            new_political_capital: stats.political_capital,
            message: outcome.message,
        })
    }

    /// File as a candidate, debiting the filing fee atomically with the
    /// candidacy record.
    pub fn file_for_election(
        &self,
        player: PlayerId,
        election: ElectionId,
    ) -> Result<FilingReport, EngineError> {
        let handle = self.arena.handle(player)?;
        let now = self.clock.now();
        let mut state = lock_bounded(
            &handle,
            player,
            self.config.lock_timeout,
            self.config.lock_retry_interval,
        )?;
        let mut book = self.book()?;
        let fee = book.validate_filing(&state.profile, election, now)?;
        let cost = ActionCost {
            action_points: 0,
            funds: fee,
            political_capital: 0,
        };
        state
            .ledger
            .try_debit(&cost)
            .map_err(EngineError::from_shortfall)?;
        let candidacy = book.record_filing(election, player, fee, now);
        let new_funds = state.ledger.funds();
        drop(book);
        drop(state);

        tracing::debug!("{player} filed for {election} as {candidacy}, fee {fee}");
        Ok(FilingReport {
            candidacy,
            fee_paid: fee,
            new_funds,
        })
    }

    /// Withdraw a candidacy, refunding the filing fee in full. Legal only
    /// while the candidacy is still `accepting_candidates` and the deadline
    /// has not passed; anything else is an error, never a silent no-op.
    pub fn withdraw_from_election(
        &self,
        player: PlayerId,
        election: ElectionId,
    ) -> Result<WithdrawalReport, EngineError> {
        let handle = self.arena.handle(player)?;
        let now = self.clock.now();
        let mut state = lock_bounded(
            &handle,
            player,
            self.config.lock_timeout,
            self.config.lock_retry_interval,
        )?;
        let mut book = self.book()?;
        let (candidacy, refund) = book.validate_withdrawal(player, election, now)?;
        state.ledger.credit_funds(refund);
        book.record_withdrawal(candidacy);
        let new_funds = state.ledger.funds();
        drop(book);
        drop(state);

        tracing::debug!("{player} withdrew {candidacy} from {election}, refund {refund}");
        Ok(WithdrawalReport {
            candidacy,
            refund,
            new_funds,
        })
    }

    /// Credit action points outside the action pipeline (turn upkeep).
    pub fn credit_action_points(
        &self,
        player: PlayerId,
        amount: u32,
    ) -> Result<StatsSnapshot, EngineError> {
        let handle = self.arena.handle(player)?;
        let mut state = lock_bounded(
            &handle,
            player,
            self.config.lock_timeout,
            self.config.lock_retry_interval,
        )?;
        state.ledger.apply_delta(&StatDelta {
            action_points: i64::from(amount),
            ..StatDelta::default()
        });
        Ok(state.ledger.snapshot())
    }

    /// Authoritative resource snapshot for one player.
    pub fn stats(&self, player: PlayerId) -> Result<StatsSnapshot, EngineError> {
        let handle = self.arena.handle(player)?;
        let state = lock_bounded(
            &handle,
            player,
            self.config.lock_timeout,
            self.config.lock_retry_interval,
        )?;
        Ok(state.ledger.snapshot())
    }

    pub fn election(&self, id: ElectionId) -> Result<Election, EngineError> {
        self.book()?
            .election(id)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownElection(id).into())
    }

    pub fn candidacy(&self, id: CandidacyId) -> Result<ElectionCandidacy, EngineError> {
        self.book()?
            .candidacy(id)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownCandidacy(id).into())
    }

    /// A player's candidacy in one election, if they ever filed.
    pub fn candidacy_of(
        &self,
        election: ElectionId,
        player: PlayerId,
    ) -> Result<Option<ElectionCandidacy>, EngineError> {
        Ok(self.book()?.candidacy_for(election, player).cloned())
    }

    /// Capture all mutable engine state. Players are locked one at a time in
    /// id order, so each record is internally consistent and the whole is a
    /// sequential composition, not a global freeze.
    pub fn snapshot(&self) -> Result<EngineSnapshot, EngineError> {
        let mut players = Vec::new();
        for (id, handle) in self.arena.handles()? {
            let state = lock_bounded(
                &handle,
                id,
                self.config.lock_timeout,
                self.config.lock_retry_interval,
            )?;
            players.push(PlayerRecord {
                profile: state.profile.clone(),
                ledger: state.ledger.clone(),
                cooldowns: state.cooldowns.clone(),
            });
        }
        let book = self.book()?;
        Ok(EngineSnapshot {
            players,
            elections: book.elections().cloned().collect(),
            candidacies: book.candidacies().cloned().collect(),
            next_candidacy_id: book.next_candidacy_id(),
        })
    }

    /// Lookup, category check, gates, progressive cost, debit, effect,
    /// cooldown stamp, snapshot. Shared by every self-targeted operation.
    fn perform_self_action(
        &self,
        player: PlayerId,
        action_id: &str,
        expected: ActionCategory,
        params: Option<&Value>,
    ) -> Result<ActionReport, EngineError> {
        let Some(def) = self.catalog.get(action_id) else {
            return Err(ValidationError::UnknownAction(action_id.to_string()).into());
        };
        if def.category != expected {
            return Err(ValidationError::WrongCategory {
                action: def.id.clone(),
                expected,
                actual: def.category,
            }
            .into());
        }
        let handle = self.arena.handle(player)?;
        let now = self.clock.now();
        let mut state = lock_bounded(
            &handle,
            player,
            self.config.lock_timeout,
            self.config.lock_retry_interval,
        )?;
        check_gates(&state, def, now)?;
        let cost = debit_cost(&mut state, def)?;
        let outcome = effects::apply(&def.effect, &mut *self.rng()?, &mut state.ledger, None);
        state.cooldowns.record(&def.id, now);
        let stats = state.ledger.snapshot();
        drop(state);

        let message = match params {
            Some(value) if !value.is_null() => format!("{} ({value})", outcome.message),
            _ => outcome.message,
        };
        tracing::debug!("{player} resolved `{}`: {message}", def.id);
        Ok(ActionReport {
            action: def.id.clone(),
            outcome: outcome.label,
            message,
            cost,
            stats,
        })
    }

    fn book(&self) -> Result<MutexGuard<'_, ElectionBook>, EngineError> {
        self.elections
            .lock()
            .map_err(|_| EngineError::System("election book poisoned".to_string()))
    }

    fn rng(&self) -> Result<MutexGuard<'_, SmallRng>, EngineError> {
        self.rng
            .lock()
            .map_err(|_| EngineError::System("outcome rng poisoned".to_string()))
    }
}

/// Eligibility gates and cooldown, checked against the live ledger. Read
/// only; the ledger is untouched on failure.
fn check_gates(
    state: &PlayerState,
    def: &ActionDefinition,
    now: Timestamp,
) -> Result<(), EngineError> {
    for req in &def.requirements {
        let available = state.ledger.stat(req.stat);
        if available < req.min {
            return Err(EngineError::Insufficient {
                resource: req.stat,
                required: req.min,
                available,
            });
        }
    }
    if !state.cooldowns.is_available(&def.id, def.cooldown_ms, now) {
        return Err(EngineError::CooldownActive {
            action: def.id.clone(),
            remaining_ms: state.cooldowns.remaining_millis(&def.id, def.cooldown_ms, now),
        });
    }
    Ok(())
}

/// Progressive cost from the live ledger, then the all-or-nothing debit.
fn debit_cost(state: &mut PlayerState, def: &ActionDefinition) -> Result<ActionCost, EngineError> {
    let sample = def
        .scaling
        .as_ref()
        .map_or(0.0, |scaling| state.ledger.stat(scaling.reference_stat));
    let cost = compute_cost(def, sample);
    state.ledger.try_debit(&cost).map_err(EngineError::from_shortfall)?;
    Ok(cost)
}
