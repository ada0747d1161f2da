use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use crate::engine::error::{EngineError, ValidationError};
use crate::model::{CooldownTracker, PlayerId, PlayerProfile, ResourceLedger};

/// Everything owned by a single player, guarded as one unit so an action's
/// cost check, debit, and effect land atomically.
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub profile: PlayerProfile,
    pub ledger: ResourceLedger,
    pub cooldowns: CooldownTracker,
}

impl PlayerState {
    pub fn new(profile: PlayerProfile, ledger: ResourceLedger) -> Self {
        Self {
            profile,
            ledger,
            cooldowns: CooldownTracker::new(),
        }
    }
}

/// Registry of per-player state.
///
/// The outer map is read-locked for lookup and write-locked only to admit new
/// players; each player's state sits behind its own mutex, so actions on
/// different players never contend with each other.
#[derive(Debug, Default)]
pub struct LedgerArena {
    players: RwLock<BTreeMap<PlayerId, Arc<Mutex<PlayerState>>>>,
}

impl LedgerArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a new player. Rejects duplicates.
    pub fn admit(&self, state: PlayerState) -> Result<(), EngineError> {
        let id = state.profile.id;
        let mut players = self
            .players
            .write()
            .map_err(|_| EngineError::System("player registry poisoned".to_string()))?;
        if players.contains_key(&id) {
            return Err(ValidationError::DuplicatePlayer(id).into());
        }
        players.insert(id, Arc::new(Mutex::new(state)));
        Ok(())
    }

    /// Fetch the handle for a player's state without locking it.
    pub fn handle(&self, player: PlayerId) -> Result<Arc<Mutex<PlayerState>>, EngineError> {
        let players = self
            .players
            .read()
            .map_err(|_| EngineError::System("player registry poisoned".to_string()))?;
        players
            .get(&player)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownPlayer(player).into())
    }

    /// Handles for every player, in id order.
    pub fn handles(&self) -> Result<Vec<(PlayerId, Arc<Mutex<PlayerState>>)>, EngineError> {
        let players = self
            .players
            .read()
            .map_err(|_| EngineError::System("player registry poisoned".to_string()))?;
        Ok(players
            .iter()
            .map(|(id, state)| (*id, Arc::clone(state)))
            .collect())
    }

    pub fn len(&self) -> usize {
        self.players.read().map(|players| players.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Acquire a player's mutex, giving up after `timeout`.
///
/// Acquisition is a try-lock loop rather than a blocking `lock` so a wedged
/// holder surfaces as a retryable [`EngineError::Busy`] instead of an
/// unbounded wait.
pub fn lock_bounded<'a>(
    state: &'a Mutex<PlayerState>,
    player: PlayerId,
    timeout: Duration,
    retry_interval: Duration,
) -> Result<MutexGuard<'a, PlayerState>, EngineError> {
    let deadline = Instant::now() + timeout;
    loop {
        match state.try_lock() {
            Ok(guard) => return Ok(guard),
            Err(TryLockError::Poisoned(_)) => {
                return Err(EngineError::System(format!("state for {player} poisoned")));
            }
            Err(TryLockError::WouldBlock) => {
                if Instant::now() >= deadline {
                    tracing::warn!("{player} still locked after {timeout:?}, reporting busy");
                    return Err(EngineError::Busy { player });
                }
                thread::sleep(retry_interval);
            }
        }
    }
}

/// Lock two distinct players' states, always acquiring the lower player id
/// first so concurrent cross-player actions cannot deadlock. Guards come back
/// in argument order: `(a, b)`.
///
/// # Panics
/// Panics if both arguments name the same player.
pub fn lock_pair<'a>(
    a: &'a Mutex<PlayerState>,
    a_id: PlayerId,
    b: &'a Mutex<PlayerState>,
    b_id: PlayerId,
    timeout: Duration,
    retry_interval: Duration,
) -> Result<(MutexGuard<'a, PlayerState>, MutexGuard<'a, PlayerState>), EngineError> {
    assert!(a_id != b_id, "pair lock requires distinct players");
    if a_id < b_id {
        let guard_a = lock_bounded(a, a_id, timeout, retry_interval)?;
        let guard_b = lock_bounded(b, b_id, timeout, retry_interval)?;
        Ok((guard_a, guard_b))
    } else {
        let guard_b = lock_bounded(b, b_id, timeout, retry_interval)?;
        let guard_a = lock_bounded(a, a_id, timeout, retry_interval)?;
        Ok((guard_a, guard_b))
    }
}
