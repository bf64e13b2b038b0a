#![deny(warnings)]

//! Persistence layer: catalog loading and the two append-only stores.
//!
//! Both stores are JSON-lines files, one record per line. Records are only
//! ever appended; nothing rewrites or reorders prior lines. The saturation
//! map inside a state record is keyed by champion id and the seasonality is
//! stored once per round, so rows stay meaningful if the catalog is ever
//! reordered on disk.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sim_core::{validate_state_against_catalog, Catalog, ChampionEntry, HistoryEntry, RoundState, SimError};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors from the store layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying filesystem failure.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A line in a store file failed to decode.
    #[error("malformed record in {path} at line {line}: {source}")]
    Decode {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    /// The state store exists but holds no rows.
    #[error("state store {path} holds no rows")]
    EmptyStore { path: PathBuf },
    /// Domain-level failure, e.g. state/catalog mismatch.
    #[error(transparent)]
    Sim(#[from] SimError),
}

fn io_err(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn append_record<T: Serialize>(path: &Path, record: &T) -> Result<(), StoreError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_err(path, e))?;
    let line = serde_json::to_string(record).map_err(|e| StoreError::Decode {
        path: path.to_path_buf(),
        line: 0,
        source: e,
    })?;
    writeln!(file, "{line}").map_err(|e| io_err(path, e))?;
    Ok(())
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let mut records = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|e| StoreError::Decode {
            path: path.to_path_buf(),
            line: idx + 1,
            source: e,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Durable record of per-round state. Append-only; the latest row is the
/// authoritative current state.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create the store with the round-1 bootstrap row. Idempotent: if the
    /// store already exists this is a no-op.
    pub fn bootstrap(&self, catalog: &Catalog) -> Result<(), StoreError> {
        if self.exists() {
            return Ok(());
        }
        let state = RoundState::bootstrap(catalog);
        append_record(&self.path, &state)?;
        info!(path = %self.path.display(), "state store bootstrapped at round 1");
        Ok(())
    }

    /// Append a new state row. Never rewrites prior rows.
    pub fn append(&self, state: &RoundState) -> Result<(), StoreError> {
        append_record(&self.path, state)?;
        info!(round = state.round, "state row appended");
        Ok(())
    }

    /// All state rows in store order.
    pub fn load_all(&self) -> Result<Vec<RoundState>, StoreError> {
        read_records(&self.path)
    }

    /// The latest state row, validated against the catalog.
    pub fn load_latest(&self, catalog: &Catalog) -> Result<RoundState, StoreError> {
        let rows = self.load_all()?;
        let latest = rows.into_iter().last().ok_or_else(|| StoreError::EmptyStore {
            path: self.path.clone(),
        })?;
        validate_state_against_catalog(&latest, catalog)?;
        Ok(latest)
    }

    fn size_bytes(&self) -> Result<u64, StoreError> {
        std::fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|e| io_err(&self.path, e))
    }

    fn truncate_to(&self, len: u64) -> Result<(), StoreError> {
        let file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|e| io_err(&self.path, e))?;
        file.set_len(len).map_err(|e| io_err(&self.path, e))
    }
}

/// Append-only ledger of completed rounds.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create an empty ledger file if absent. Idempotent.
    pub fn create_if_absent(&self) -> Result<(), StoreError> {
        if self.exists() {
            return Ok(());
        }
        File::create(&self.path).map_err(|e| io_err(&self.path, e))?;
        info!(path = %self.path.display(), "history store created");
        Ok(())
    }

    pub fn append(&self, entry: &HistoryEntry) -> Result<(), StoreError> {
        append_record(&self.path, entry)
    }

    /// All ledger rows in store order, which is ascending by round since
    /// rounds are only ever appended in order.
    pub fn load_all(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        read_records(&self.path)
    }
}

/// Load the external read-only catalog file (a JSON array of entries).
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog, StoreError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let entries: Vec<ChampionEntry> =
        serde_json::from_str(&contents).map_err(|e| StoreError::Decode {
            path: path.to_path_buf(),
            line: 0,
            source: e,
        })?;
    let catalog = Catalog::new(entries)?;
    info!(path = %path.display(), champions = catalog.len(), "catalog loaded");
    Ok(catalog)
}

/// Idempotent startup initialization: bootstrap the state store and create
/// the history ledger if either is absent. Invoked once by the host, kept
/// separate from the engine's pure logic.
pub fn ensure_initialized(
    catalog: &Catalog,
    state_store: &StateStore,
    history_store: &HistoryStore,
) -> Result<(), StoreError> {
    state_store.bootstrap(catalog)?;
    history_store.create_if_absent()?;
    Ok(())
}

/// Commit a completed round to both stores as one effective transaction.
///
/// The state row is appended first; if the history append then fails, the
/// state file is truncated back to its pre-commit length so the stores never
/// diverge. No automatic retry: on failure the round is simply not advanced
/// and the caller may resubmit.
pub fn commit_round(
    state_store: &StateStore,
    history_store: &HistoryStore,
    state: &RoundState,
    entry: &HistoryEntry,
) -> Result<(), StoreError> {
    let checkpoint = state_store.size_bytes()?;
    state_store.append(state)?;
    if let Err(e) = history_store.append(entry) {
        warn!(round = entry.round, "history append failed, rolling back state row");
        if let Err(rollback) = state_store.truncate_to(checkpoint) {
            error!(%rollback, "state rollback failed, stores may diverge");
        }
        return Err(e);
    }
    info!(round = entry.round, "round committed");
    Ok(())
}
