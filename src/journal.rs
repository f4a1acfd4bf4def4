//! Persisted game records.
//!
//! One append-only line-delimited JSON log per game, plus an optional
//! snapshot directory holding full `GameState` blobs by phase. Field
//! names are stable; unknown fields are ignored on read so newer logs
//! stay readable by older code.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::game::state::GameState;
use crate::runtime::events::GameEvent;

/// One line in the game log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum JournalRecord {
    /// The config echo written at game start.
    GameConfig { game_id: String, agents: usize },
    /// A coordinator event.
    Event { event: GameEvent },
    /// A full state snapshot (also written to the snapshot dir).
    State { state: GameState },
}

/// Append-only journal for one game.
pub struct GameJournal {
    log: File,
    snapshot_dir: Option<PathBuf>,
}

impl GameJournal {
    /// Creates (or appends to) `<dir>/<game_id>.jsonl`.
    pub fn create(dir: impl AsRef<Path>, game_id: &str) -> std::io::Result<GameJournal> {
        fs::create_dir_all(dir.as_ref())?;
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.as_ref().join(format!("{}.jsonl", game_id)))?;
        Ok(GameJournal { log, snapshot_dir: None })
    }

    /// Also write per-phase `GameState` blobs under `dir`.
    pub fn with_snapshots(mut self, dir: impl AsRef<Path>) -> std::io::Result<GameJournal> {
        fs::create_dir_all(dir.as_ref())?;
        self.snapshot_dir = Some(dir.as_ref().to_path_buf());
        Ok(self)
    }

    /// Appends one record as a single JSON line.
    pub fn append(&mut self, record: &JournalRecord) -> std::io::Result<()> {
        let line = serde_json::to_string(record)?;
        writeln!(self.log, "{}", line)
    }

    /// Appends a state record and, when configured, writes the snapshot
    /// blob named by phase.
    pub fn snapshot(&mut self, state: &GameState) -> std::io::Result<()> {
        self.append(&JournalRecord::State { state: state.clone() })?;
        if let Some(dir) = &self.snapshot_dir {
            let name = format!(
                "{}_{:?}_{:?}.json",
                state.year, state.season, state.phase
            )
            .to_ascii_lowercase();
            fs::write(dir.join(name), serde_json::to_vec_pretty(state)?)?;
        }
        Ok(())
    }
}

/// Reads a journal back, skipping lines that no longer parse.
pub fn read_journal(path: impl AsRef<Path>) -> std::io::Result<Vec<JournalRecord>> {
    let file = File::open(path)?;
    let mut out = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(record) = serde_json::from_str(&line) {
            out.push(record);
        }
    }
    Ok(out)
}
