//! A `LedgerStore` standing in for a ledger that could not be opened.
//!
//! Every operation fails with the original open error. Behind a
//! `BestEffort` `Ledger` this still lets questions be answered; each record
//! comes back with `persisted = false`.

use oracle_contracts::{
    error::{OracleError, OracleResult},
    record::AuditRecord,
};
use oracle_core::traits::LedgerStore;

pub struct OfflineLedgerStore {
    reason: String,
}

impl OfflineLedgerStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn unavailable(&self) -> OracleError {
        OracleError::LedgerReadFailed {
            reason: format!("ledger unavailable: {}", self.reason),
        }
    }
}

impl LedgerStore for OfflineLedgerStore {
    fn insert(&self, _record: &AuditRecord) -> OracleResult<()> {
        Err(OracleError::LedgerWriteFailed {
            reason: format!("ledger unavailable: {}", self.reason),
        })
    }

    fn latest_hash(&self) -> OracleResult<String> {
        Err(self.unavailable())
    }

    fn get_by_hash(&self, _hash: &str) -> OracleResult<Option<AuditRecord>> {
        Err(self.unavailable())
    }

    fn list_recent(&self, _limit: usize) -> OracleResult<Vec<AuditRecord>> {
        Err(self.unavailable())
    }

    fn all_in_order(&self) -> OracleResult<Vec<AuditRecord>> {
        Err(self.unavailable())
    }
}
