use std::collections::BTreeMap;

use sqlx::{PgPool, Row};

use crate::model::{
    CandidacyId, CandidacyStatus, CooldownTracker, Election, ElectionCandidacy, ElectionId,
    ElectionPhase, EngineSnapshot, PlayerId, PlayerProfile, PlayerRecord, ResourceLedger, Timestamp,
};

/// Read a complete engine snapshot back out of Postgres.
///
/// Rows come back in id order, so a loaded snapshot compares equal to the one
/// `save_snapshot` wrote. An empty database yields an empty snapshot with the
/// candidacy id generator at its starting value.
pub async fn load_snapshot(pool: &PgPool) -> Result<EngineSnapshot, sqlx::Error> {
    // Cooldowns first, grouped per player so each record can take its own.
    let mut cooldowns: BTreeMap<u64, Vec<(String, Timestamp)>> = BTreeMap::new();
    let rows =
        sqlx::query("SELECT player_id, action_id, last_used FROM cooldowns ORDER BY player_id, action_id")
            .fetch_all(pool)
            .await?;
    for row in &rows {
        let player_id: i64 = row.try_get("player_id")?;
        let action_id: String = row.try_get("action_id")?;
        let last_used: i64 = row.try_get("last_used")?;
        cooldowns
            .entry(player_id as u64)
            .or_default()
            .push((action_id, Timestamp::from_millis(last_used as u64)));
    }

    let mut players = Vec::new();
    let rows = sqlx::query(
        "SELECT id, name, home_region, party, funds, approval, political_capital, action_points, \
         name_recognition, campaign_strength FROM players ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    for row in &rows {
        let id: i64 = row.try_get("id")?;
        let profile = PlayerProfile {
            id: PlayerId(id as u64),
            name: row.try_get("name")?,
            home_region: row.try_get("home_region")?,
            party: row.try_get("party")?,
        };
        let ledger = ResourceLedger::new(
            row.try_get("funds")?,
            row.try_get("approval")?,
            row.try_get::<i32, _>("political_capital")? as u32,
            row.try_get::<i32, _>("action_points")? as u32,
            row.try_get("name_recognition")?,
            row.try_get("campaign_strength")?,
        );
        let records = cooldowns.remove(&(id as u64)).unwrap_or_default();
        players.push(PlayerRecord {
            profile,
            ledger,
            cooldowns: CooldownTracker::from_records(records),
        });
    }

    let mut elections = Vec::new();
    let rows = sqlx::query(
        "SELECT id, name, region, party, filing_fee, filing_deadline, phase FROM elections ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    for row in &rows {
        let id: i64 = row.try_get("id")?;
        let deadline: i64 = row.try_get("filing_deadline")?;
        let phase: String = row.try_get("phase")?;
        elections.push(Election {
            id: ElectionId(id as u64),
            name: row.try_get("name")?,
            region: row.try_get("region")?,
            party: row.try_get("party")?,
            filing_fee: row.try_get("filing_fee")?,
            filing_deadline: Timestamp::from_millis(deadline as u64),
            phase: parse_phase(&phase)?,
        });
    }

    let mut candidacies = Vec::new();
    let rows = sqlx::query(
        "SELECT id, election_id, player_id, status, fee_paid, filed_at FROM candidacies ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    for row in &rows {
        let id: i64 = row.try_get("id")?;
        let election_id: i64 = row.try_get("election_id")?;
        let player_id: i64 = row.try_get("player_id")?;
        let status: String = row.try_get("status")?;
        let filed_at: i64 = row.try_get("filed_at")?;
        candidacies.push(ElectionCandidacy {
            id: CandidacyId(id as u64),
            election_id: ElectionId(election_id as u64),
            player_id: PlayerId(player_id as u64),
            status: parse_status(&status)?,
            fee_paid: row.try_get("fee_paid")?,
            filed_at: Timestamp::from_millis(filed_at as u64),
        });
    }

    let next: Option<i64> =
        sqlx::query_scalar("SELECT value FROM engine_meta WHERE key = 'next_candidacy_id'")
            .fetch_optional(pool)
            .await?;

    Ok(EngineSnapshot {
        players,
        elections,
        candidacies,
        next_candidacy_id: next.map_or(1, |v| v as u64),
    })
}

fn parse_phase(s: &str) -> Result<ElectionPhase, sqlx::Error> {
    match s {
        "accepting_candidates" => Ok(ElectionPhase::AcceptingCandidates),
        "campaign_active" => Ok(ElectionPhase::CampaignActive),
        "closed" => Ok(ElectionPhase::Closed),
        other => Err(sqlx::Error::Decode(
            format!("unknown election phase `{other}`").into(),
        )),
    }
}

fn parse_status(s: &str) -> Result<CandidacyStatus, sqlx::Error> {
    match s {
        "accepting_candidates" => Ok(CandidacyStatus::AcceptingCandidates),
        "campaign_active" => Ok(CandidacyStatus::CampaignActive),
        "closed" => Ok(CandidacyStatus::Closed),
        "withdrawn" => Ok(CandidacyStatus::Withdrawn),
        other => Err(sqlx::Error::Decode(
            format!("unknown candidacy status `{other}`").into(),
        )),
    }
}
