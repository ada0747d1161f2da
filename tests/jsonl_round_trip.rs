mod common;

use campaign_engine::flush::flush_snapshot;
use campaign_engine::model::PlayerRecord;

#[test]
fn flush_produces_valid_jsonl_files() {
    let snapshot = common::build_test_snapshot();
    let dir = tempfile::tempdir().unwrap();

    flush_snapshot(&snapshot, dir.path()).unwrap();

    // All 4 files exist
    let players_path = dir.path().join("players.jsonl");
    let cooldowns_path = dir.path().join("cooldowns.jsonl");
    let elections_path = dir.path().join("elections.jsonl");
    let candidacies_path = dir.path().join("candidacies.jsonl");

    assert!(players_path.exists());
    assert!(cooldowns_path.exists());
    assert!(elections_path.exists());
    assert!(candidacies_path.exists());

    // Correct line counts
    let player_lines = common::read_lines(&players_path);
    let cooldown_lines = common::read_lines(&cooldowns_path);
    let election_lines = common::read_lines(&elections_path);
    let candidacy_lines = common::read_lines(&candidacies_path);

    assert_eq!(player_lines.len(), 2, "expected 2 players");
    assert_eq!(cooldown_lines.len(), 1, "expected 1 cooldown record");
    assert_eq!(election_lines.len(), 1, "expected 1 election");
    assert_eq!(candidacy_lines.len(), 1, "expected 1 candidacy");

    // Each line is valid JSON with expected fields
    for line in &player_lines {
        let v: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(v.get("profile").is_some());
        assert!(v["profile"].get("id").is_some());
        assert!(v["ledger"].get("funds").is_some());
        assert!(v["ledger"].get("approval").is_some());
        assert!(v.get("cooldowns").is_some());
    }

    for line in &cooldown_lines {
        let v: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(v.get("player_id").is_some());
        assert!(v.get("action_id").is_some());
        assert!(v.get("last_used").is_some());
    }

    for line in &election_lines {
        let v: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(v.get("id").is_some());
        assert!(v.get("region").is_some());
        assert!(v.get("filing_fee").is_some());
        assert!(v.get("filing_deadline").is_some());
        assert!(v.get("phase").is_some());
    }

    for line in &candidacy_lines {
        let v: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(v.get("election_id").is_some());
        assert!(v.get("player_id").is_some());
        assert!(v.get("status").is_some());
        assert!(v.get("fee_paid").is_some());
    }
}

#[test]
fn flush_preserves_field_values() {
    let snapshot = common::build_test_snapshot();
    let dir = tempfile::tempdir().unwrap();

    flush_snapshot(&snapshot, dir.path()).unwrap();

    let player_lines = common::read_lines(&dir.path().join("players.jsonl"));

    // First player: Dana, partisan, fee already debited, no cooldowns.
    let dana: serde_json::Value = serde_json::from_str(&player_lines[0]).unwrap();
    assert_eq!(dana["profile"]["id"], 1);
    assert_eq!(dana["profile"]["name"], "Dana Reeves");
    assert_eq!(dana["profile"]["party"], "Unity");
    assert_eq!(dana["ledger"]["funds"], 49_000);
    assert_eq!(dana["ledger"]["action_points"], 100);
    assert_eq!(dana["cooldowns"], serde_json::json!({}));

    // Second player: Lee, independent (party omitted), fresh off a speech.
    let lee: serde_json::Value = serde_json::from_str(&player_lines[1]).unwrap();
    assert_eq!(lee["profile"]["name"], "Lee Okafor");
    assert!(lee["profile"].get("party").is_none());
    assert_eq!(lee["ledger"]["approval"], 46.5);
    assert_eq!(lee["ledger"]["action_points"], 75);
    assert_eq!(lee["ledger"]["name_recognition"], 12.0);
    assert_eq!(lee["cooldowns"]["stump_speech"], 1_000);

    // Cooldown row: snake_case action id and millisecond timestamp.
    let cooldown_lines = common::read_lines(&dir.path().join("cooldowns.jsonl"));
    let row: serde_json::Value = serde_json::from_str(&cooldown_lines[0]).unwrap();
    assert_eq!(row["player_id"], 2);
    assert_eq!(row["action_id"], "stump_speech");
    assert_eq!(row["last_used"], 1_000);

    // Election and candidacy carry their snake_case states.
    let election_lines = common::read_lines(&dir.path().join("elections.jsonl"));
    let election: serde_json::Value = serde_json::from_str(&election_lines[0]).unwrap();
    assert_eq!(election["id"], 7);
    assert_eq!(election["name"], "OH Governor");
    assert_eq!(election["phase"], "accepting_candidates");
    assert!(election.get("party").is_none());

    let candidacy_lines = common::read_lines(&dir.path().join("candidacies.jsonl"));
    let candidacy: serde_json::Value = serde_json::from_str(&candidacy_lines[0]).unwrap();
    assert_eq!(candidacy["id"], 1);
    assert_eq!(candidacy["election_id"], 7);
    assert_eq!(candidacy["player_id"], 1);
    assert_eq!(candidacy["status"], "accepting_candidates");
    assert_eq!(candidacy["fee_paid"], 1_000);
}

#[test]
fn player_lines_parse_back_to_records() {
    let snapshot = common::build_test_snapshot();
    let dir = tempfile::tempdir().unwrap();

    flush_snapshot(&snapshot, dir.path()).unwrap();

    let player_lines = common::read_lines(&dir.path().join("players.jsonl"));
    let parsed: Vec<PlayerRecord> = player_lines
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(parsed, snapshot.players);
}
