//! In-memory implementation of `LedgerStore`.
//!
//! Records live in a `Vec` in insertion order with a hash → position index,
//! both behind one `RwLock`. Readers never block each other, and a reader
//! sees either the chain before an insert or after it, never a half-written
//! record.

use std::collections::HashMap;
use std::sync::RwLock;

use oracle_contracts::{
    error::{OracleError, OracleResult},
    record::AuditRecord,
};
use oracle_core::traits::LedgerStore;

#[derive(Default)]
struct MemoryState {
    records: Vec<AuditRecord>,
    by_hash: HashMap<String, usize>,
}

/// A volatile ledger store for tests and single-process use.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<MemoryState>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_error(e: impl std::fmt::Display) -> OracleError {
        OracleError::LedgerReadFailed {
            reason: format!("ledger state lock poisoned: {}", e),
        }
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn insert(&self, record: &AuditRecord) -> OracleResult<()> {
        let mut state = self.state.write().map_err(|e| OracleError::LedgerWriteFailed {
            reason: format!("ledger state lock poisoned: {}", e),
        })?;

        if state.by_hash.contains_key(&record.hash) {
            return Err(OracleError::LedgerWriteFailed {
                reason: format!("record '{}' is already stored", record.hash),
            });
        }

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
