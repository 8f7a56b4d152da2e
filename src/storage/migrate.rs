use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use tokio::fs;
use tracing::{info, warn};

use super::json::write_array;
use crate::shoe::{LogEntry, Round, ShoeEvent, ShoeId};
use crate::types::Outcome;

pub const DEFAULT_ROUNDS_PER_SHOE: usize = 85;
/// A trailing chunk shorter than this is dropped rather than made a shoe
pub const MIN_SHOE_ROUNDS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub rounds_read: usize,
    pub shoes_written: usize,
    pub rounds_skipped: usize,
    pub backup: PathBuf,
}

/// Rewrite a pre-shoe data file as a marked event log, keeping a `.bak` copy
pub async fn migrate_legacy_file(path: &Path, rounds_per_shoe: usize) -> Result<MigrationReport> {
    if rounds_per_shoe == 0 {
        bail!("rounds per shoe must be positive");
    }
    if fs::metadata(path).await.is_err() {
        bail!("data file {} was not found", path.display());
    }

    let mut backup = path.as_os_str().to_owned();
    backup.push(".bak");
    let backup = PathBuf::from(backup);
    fs::copy(path, &backup)
        .await
        .with_context(|| format!("could not create backup {}", backup.display()))?;
    info!("Backup created at {}", backup.display());

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("could not read {}", path.display()))?;
    let legacy: Value = serde_json::from_str(&raw).with_context(|| format!("could not parse {}", path.display()))?;

    let rounds = flatten_legacy(legacy)?;
    let rounds_read = rounds.len();
    info!("Loaded {} legacy rounds", rounds_read);

    let entries = mark_shoes(&rounds, rounds_per_shoe)?;
    let shoes_written = entries
        .iter()
        .filter(|e| matches!(e, LogEntry::Event(_)))
        .count()
        / 2;
    let rounds_written = entries.iter().filter(|e| e.as_round().is_some()).count();

    write_array(path, &entries).await?;
    info!("Migration complete: {} shoes written to {}", shoes_written, path.display());

    Ok(MigrationReport {
        rounds_read,
        shoes_written,
        rounds_skipped: rounds_read - rounds_written,
        backup,
    })
}

/// Accepts a flat list of rounds or `{"shoes": [{"outcomes": [...]}]}`
pub fn flatten_legacy(legacy: Value) -> Result<Vec<Value>> {
    match legacy {
        Value::Array(rounds) => Ok(rounds),
        Value::Object(mut obj) if obj.contains_key("shoes") => {
            let shoes = match obj.remove("shoes") {
                Some(Value::Array(shoes)) => shoes,
                _ => bail!("'shoes' is not a list"),
            };
            Ok(shoes
                .into_iter()
                .flat_map(|mut shoe| match shoe.get_mut("outcomes").map(Value::take) {
                    Some(Value::Array(outcomes)) => outcomes,
                    _ => Vec::new(),
                })
                .collect())
        }
        _ => bail!("data is not in a recognized list format"),
    }
}

/// Chunk rounds into shoes wrapped by START/END markers, numbering both
/// shoes and rounds from 1.
pub fn mark_shoes(rounds: &[Value], rounds_per_shoe: usize) -> Result<Vec<LogEntry>> {
    let mut entries = Vec::with_capacity(rounds.len() + 2 * (rounds.len() / rounds_per_shoe.max(1) + 1));
    let mut shoe_number = 1;

    for chunk in rounds.chunks(rounds_per_shoe.max(1)) {
        if chunk.len() < MIN_SHOE_ROUNDS {
            warn!("Skipping final chunk of {} rounds (too small)", chunk.len());
            continue;
        }

        let shoe_id = ShoeId::from_number(shoe_number);
        entries.push(LogEntry::Event(ShoeEvent::start(shoe_id.clone())));
        for (idx, legacy) in chunk.iter().enumerate() {
            let round = legacy_round(legacy, &shoe_id, idx as u32 + 1)
                .with_context(|| format!("round {} of {}", idx + 1, shoe_id))?;
            entries.push(LogEntry::Round(round));
        }
        entries.push(LogEntry::Event(ShoeEvent::end(shoe_id.clone())));

        info!("Added markers and {} rounds for {}", chunk.len(), shoe_id);
        shoe_number += 1;
    }

    Ok(entries)
}

fn legacy_round(legacy: &Value, shoe_id: &ShoeId, round_index: u32) -> Result<Round> {
    let mut fields = match legacy {
        Value::Object(fields) => fields.clone(),
        Value::String(code) => {
            let mut fields = Map::new();
            fields.insert("outcome".into(), Value::String(code.clone()));
            fields
        }
        other => bail!("unrecognized round {}", other),
    };

    let outcome = match fields.get("outcome") {
        Some(Value::String(raw)) => Outcome::from_str(raw)?,
        _ => bail!("round has no outcome"),
    };
    fields.insert("outcome".into(), Value::String(outcome.as_str().into()));
    fields.insert("shoe_id".into(), Value::String(shoe_id.as_str().into()));
    fields.insert("round".into(), Value::from(round_index));

    Ok(serde_json::from_value(Value::Object(fields))?)
}
