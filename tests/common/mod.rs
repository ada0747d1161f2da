use std::sync::Arc;

use campaign_engine::engine::ManualClock;
use campaign_engine::model::*;
use campaign_engine::{ActionResolver, EngineConfig};

/// Engine with the standard catalog, default config, and a manual clock
/// starting at 1,000 ms.
pub fn standard_engine() -> (ActionResolver, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Timestamp::from_millis(1_000)));
    let resolver = ActionResolver::new(
        ActionCatalog::standard(),
        EngineConfig::default(),
        clock.clone(),
    );
    (resolver, clock)
}

/// Register an Ohio independent with the given spendables; other stats are
/// fixed (10 PC, 20 name recognition, 30 campaign strength).
pub fn register_player(
    resolver: &ActionResolver,
    id: u64,
    funds: i64,
    approval: f64,
    action_points: u32,
) -> PlayerId {
    let player = PlayerId(id);
    resolver
        .register_player(
            PlayerProfile::new(player, &format!("Player {id}"), "OH", None),
            ResourceLedger::new(funds, approval, 10, action_points, 20.0, 30.0),
        )
        .unwrap();
    player
}

/// Register an open (non-partisan) Ohio election: $1,000 fee, filing deadline
/// at 100,000 ms.
pub fn register_open_election(resolver: &ActionResolver, id: u64) -> ElectionId {
    let election = ElectionId(id);
    resolver
        .register_election(Election {
            id: election,
            name: format!("Election {id}"),
            region: "OH".to_string(),
            party: None,
            filing_fee: 1_000,
            filing_deadline: Timestamp::from_millis(100_000),
            phase: ElectionPhase::AcceptingCandidates,
        })
        .unwrap();
    election
}

/// Snapshot with known content for persistence tests: 2 players (one partisan,
/// one filed, one on cooldown), 1 election, 1 candidacy.
pub fn build_test_snapshot() -> EngineSnapshot {
    let (resolver, _clock) = standard_engine();

    resolver
        .register_player(
            PlayerProfile::new(PlayerId(1), "Dana Reeves", "OH", Some("Unity")),
            ResourceLedger::new(50_000, 50.0, 10, 100, 20.0, 30.0),
        )
        .unwrap();
    resolver
        .register_player(
            PlayerProfile::new(PlayerId(2), "Lee Okafor", "OH", None),
            ResourceLedger::new(25_000, 45.0, 5, 80, 10.0, 15.0),
        )
        .unwrap();
    resolver
        .register_election(Election {
            id: ElectionId(7),
            name: "OH Governor".to_string(),
            region: "OH".to_string(),
            party: None,
            filing_fee: 1_000,
            filing_deadline: Timestamp::from_millis(100_000),
            phase: ElectionPhase::AcceptingCandidates,
        })
        .unwrap();

    // Dana files (funds drop to 49,000); Lee speaks (stump_speech cooldown at
    // 1,000 ms, AP 75, approval 46.5, name recognition 12).
    resolver
        .file_for_election(PlayerId(1), ElectionId(7))
        .unwrap();
    resolver.give_speech(PlayerId(2)).unwrap();

    resolver.snapshot().unwrap()
}

pub fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}
