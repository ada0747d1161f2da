use sqlx::PgPool;

use crate::model::EngineSnapshot;

/// Persist an entire engine snapshot into Postgres using COPY FROM STDIN
/// (text format), replacing whatever snapshot was stored before.
///
/// Order respects FK constraints: players and elections before the candidacy
/// and cooldown rows that reference them.
pub async fn save_snapshot(pool: &PgPool, snapshot: &EngineSnapshot) -> Result<(), sqlx::Error> {
    sqlx::raw_sql("TRUNCATE candidacies, cooldowns, elections, players, engine_meta")
        .execute(pool)
        .await?;

    // Players
    {
        let mut buf = String::new();
        for record in &snapshot.players {
            let stats = record.ledger.snapshot();
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                record.profile.id.0 as i64,
                escape(&record.profile.name),
                escape(&record.profile.home_region),
                opt_text(record.profile.party.as_deref()),
                stats.funds,
                stats.approval,
                stats.political_capital,
                stats.action_points,
                stats.name_recognition,
                stats.campaign_strength,
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_players.sql"), &buf).await?;
    }

    // Cooldowns (after players due to FK)
    {
        let mut buf = String::new();
        for row in snapshot.cooldown_rows() {
            buf.push_str(&format!(
                "{}\t{}\t{}\n",
                row.player_id.0 as i64,
                escape(&row.action_id),
                row.last_used.as_millis() as i64,
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_cooldowns.sql"), &buf).await?;
    }

    // Elections
    {
        let mut buf = String::new();
        for election in &snapshot.elections {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                election.id.0 as i64,
                escape(&election.name),
                escape(&election.region),
                opt_text(election.party.as_deref()),
                election.filing_fee,
                election.filing_deadline.as_millis() as i64,
                election.phase.as_str(),
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_elections.sql"), &buf).await?;
    }

    // Candidacies
    {
        let mut buf = String::new();
        for candidacy in &snapshot.candidacies {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\n",
                candidacy.id.0 as i64,
                candidacy.election_id.0 as i64,
                candidacy.player_id.0 as i64,
                candidacy.status.as_str(),
                candidacy.fee_paid,
                candidacy.filed_at.as_millis() as i64,
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_candidacies.sql"), &buf).await?;
    }

    sqlx::query("INSERT INTO engine_meta (key, value) VALUES ('next_candidacy_id', $1)")
        .bind(snapshot.next_candidacy_id as i64)
        .execute(pool)
        .await?;

    Ok(())
}

/// Execute a COPY FROM STDIN with the given text-format payload.
async fn copy_in(pool: &PgPool, statement: &str, data: &str) -> Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;
    let mut copy = conn.copy_in_raw(statement).await?;
    copy.send(data.as_bytes()).await?;
    copy.finish().await?;
    Ok(())
}

/// Escape a string for Postgres COPY text format.
/// Backslash must be escaped first, then the special whitespace characters.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Render an optional text column as a COPY text value (`\N` for NULL).
fn opt_text(v: Option<&str>) -> String {
    match v {
        Some(s) => escape(s),
        None => "\\N".to_string(),
    }
}
