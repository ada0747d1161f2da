use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::model::EngineSnapshot;

/// Write an iterator of serializable items to a JSONL file (one JSON object per line).
fn write_jsonl<T: Serialize>(path: &Path, items: impl Iterator<Item = T>) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, &item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Flush an engine snapshot to JSONL files in the given output directory.
///
/// Creates the output directory if it does not exist. Writes 4 files:
/// - `players.jsonl` — one player per line (profile, ledger, cooldowns)
/// - `cooldowns.jsonl` — cooldown records flattened to one (player, action) row
/// - `elections.jsonl` — one election per line
/// - `candidacies.jsonl` — one candidacy per line
pub fn flush_snapshot(snapshot: &EngineSnapshot, output_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(output_dir)?;

    write_jsonl(&output_dir.join("players.jsonl"), snapshot.players.iter())?;
    write_jsonl(
        &output_dir.join("cooldowns.jsonl"),
        snapshot.cooldown_rows().into_iter(),
    )?;
    write_jsonl(
        &output_dir.join("elections.jsonl"),
        snapshot.elections.iter(),
    )?;
    write_jsonl(
        &output_dir.join("candidacies.jsonl"),
        snapshot.candidacies.iter(),
    )?;

    Ok(())
}
