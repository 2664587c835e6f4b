//! JSON-lines file implementation of `LedgerStore`.
//!
//! One record per line, in chain order. The file is read once on open; after
//! that, reads are served from an in-memory copy and every insert appends
//! and flushes a single line before the copy is updated. A failed write is
//! truncated back to the previous length so no partial line stays behind.
//! A crash mid-write can still leave a truncated final line, which `open`
//! reports as an error rather than silently dropping.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};

use oracle_contracts::{
    error::{OracleError, OracleResult},
    record::AuditRecord,
};
use oracle_core::traits::LedgerStore;

#[derive(Default)]
struct FileState {
    records: Vec<AuditRecord>,
    by_hash: HashMap<String, usize>,
}

pub struct JsonlLedgerStore {
    path: PathBuf,
    state: RwLock<FileState>,
}

impl JsonlLedgerStore {
    /// Open (or create) the ledger file at `path` and load its records.
    ///
    /// Returns `LedgerReadFailed` if the file cannot be read or a line is not
    /// a valid record.
    pub fn open(path: impl AsRef<Path>) -> OracleResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut state = FileState::default();

        if path.exists() {
            let file = File::open(&path).map_err(|e| OracleError::LedgerReadFailed {
                reason: format!("failed to open ledger '{}': {}", path.display(), e),
            })?;

            for (number, line) in BufReader::new(file).lines().enumerate() {
                let line = line.map_err(|e| OracleError::LedgerReadFailed {
                    reason: format!("failed to read ledger '{}': {}", path.display(), e),
                })?;
                if line.trim().is_empty() {
                    continue;
                }
                let record: AuditRecord =
                    serde_json::from_str(&line).map_err(|e| OracleError::LedgerReadFailed {
                        reason: format!(
                            "ledger '{}' line {} is not a valid record: {}",
                            path.display(),
                            number + 1,
                            e
                        ),
                    })?;
                state.by_hash.insert(record.hash.clone(), state.records.len());
                state.records.push(record);
            }
        } else if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| OracleError::LedgerWriteFailed {
                reason: format!("failed to create ledger directory '{}': {}", parent.display(), e),
            })?;
        }

        debug!(path = %path.display(), records = state.records.len(), "ledger file opened");

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    fn read_error(e: impl std::fmt::Display) -> OracleError {
        OracleError::LedgerReadFailed {
            reason: format!("ledger state lock poisoned: {}", e),
        }
    }
}

/// Append `line` and sync it, cutting the file back to its previous length
/// if either step fails.
pub(crate) fn append_line(file: &mut File, line: &[u8]) -> std::io::Result<()> {
    let start = file.metadata()?.len();
    let written = file.write_all(line).and_then(|_| file.sync_data());
    if let Err(e) = written {
        if let Err(rollback) = file.set_len(start) {
            warn!(error = %rollback, "failed to roll back partial ledger line");
        }
        return Err(e);
    }
    Ok(())
}

impl LedgerStore for JsonlLedgerStore {
    fn insert(&self, record: &AuditRecord) -> OracleResult<()> {
        let mut state = self.state.write().map_err(|e| OracleError::LedgerWriteFailed {
            reason: format!("ledger state lock poisoned: {}", e),
        })?;

        if state.by_hash.contains_key(&record.hash) {
            return Err(OracleError::LedgerWriteFailed {
                reason: format!("record '{}' is already stored", record.hash),
            });
        }

        let mut line = serde_json::to_string(record).map_err(|e| OracleError::Serialization {
            reason: format!("failed to encode record '{}': {}", record.hash, e),
        })?;
        line.push('\n');

        let write_err = |e: std::io::Error| OracleError::LedgerWriteFailed {
            reason: format!("failed to append to ledger '{}': {}", self.path.display(), e),
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(write_err)?;
        append_line(&mut file, line.as_bytes()).map_err(write_err)?;

        let position = state.records.len();
        state.by_hash.insert(record.hash.clone(), position);
        state.records.push(record.clone());
        Ok(())
    }

    fn latest_hash(&self) -> OracleResult<String> {
        let state = self.state.read().map_err(Self::read_error)?;
        Ok(state
            .records
            .last()
            .map(|r| r.hash.clone())
            .unwrap_or_default())
    }

    fn get_by_hash(&self, hash: &str) -> OracleResult<Option<AuditRecord>> {
        let state = self.state.read().map_err(Self::read_error)?;
        Ok(state
            .by_hash
            .get(hash)
            .and_then(|&i| state.records.get(i))
            .cloned())
    }

    fn list_recent(&self, limit: usize) -> OracleResult<Vec<AuditRecord>> {
        let state = self.state.read().map_err(Self::read_error)?;
        Ok(state.records.iter().rev().take(limit).cloned().collect())
    }

    fn all_in_order(&self) -> OracleResult<Vec<AuditRecord>> {
        let state = self.state.read().map_err(Self::read_error)?;
        Ok(state.records.clone())
    }
}
