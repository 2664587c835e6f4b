//! The ledger writer/reader.
//!
//! `Ledger` is the single serialization point for the chain head. Every
//! append runs under one mutex: read the head, stamp the timestamp, hash,
//! insert, advance the head. Two concurrent appends therefore can never
//! both link to the same predecessor.
//!
//! Reads go straight to the store and do not take the append lock.

use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};

use oracle_contracts::{
    error::{OracleError, OracleResult},
    record::{AppendOutcome, AuditRecord, RecordDraft, RecordSummary},
    verify::ChainAudit,
};
use oracle_core::{
    config::Durability,
    traits::{AuditWriter, LedgerStore},
};

use crate::chain::{record_hash, verify_chain};

/// Hash-chained, append-only ledger over a `LedgerStore`.
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    durability: Durability,
    /// Hash of the last persisted record; `None` until first read from the
    /// store.
    head: Mutex<Option<String>>,
}

impl Ledger {
    pub fn new(store: Arc<dyn LedgerStore>, durability: Durability) -> Self {
        Self {
            store,
            durability,
            head: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Hash of the most recently persisted record, or empty for an empty
    /// ledger.
    pub fn latest_hash(&self) -> OracleResult<String> {
        self.store.latest_hash()
    }

    pub fn get_by_hash(&self, hash: &str) -> OracleResult<Option<AuditRecord>> {
        self.store.get_by_hash(hash)
    }

    /// Up to `limit` records, most recent first.
    pub fn list(&self, limit: usize) -> OracleResult<Vec<AuditRecord>> {
        self.store.list_recent(limit)
    }

    /// Chain metadata of one record, without its question or answer.
    pub fn lookup(&self, hash: &str) -> OracleResult<Option<RecordSummary>> {
        Ok(self.store.get_by_hash(hash)?.map(|r| r.summary()))
    }

    /// Re-verify the whole stored chain from genesis.
    pub fn audit(&self) -> OracleResult<ChainAudit> {
        let records = self.store.all_in_order()?;
        let audit = verify_chain(&records);
        if audit.valid {
            debug!(records = audit.records_checked, "ledger chain verified");
        } else {
            warn!(
                records = audit.records_checked,
                first_bad_hash = audit.first_bad_hash.as_deref().unwrap_or(""),
                "ledger chain verification failed"
            );
        }
        Ok(audit)
    }

    /// Resolve the current head, loading it from the store on first use.
    ///
    /// `None` means the head could not be read under `BestEffort`; the
    /// caller must not persist anything in that case.
    fn current_head(&self, cached: &mut Option<String>) -> OracleResult<Option<String>> {
        if let Some(head) = cached.as_ref() {
            return Ok(Some(head.clone()));
        }
        match self.store.latest_hash() {
            Ok(head) => {
                *cached = Some(head.clone());
                Ok(Some(head))
            }
            Err(e) if self.durability == Durability::BestEffort => {
                warn!(error = %e, "could not read chain head; record will not be stored");
                Ok(None)
            }
            Err(e) => Err(OracleError::LedgerWriteFailed {
                reason: format!("could not read chain head: {}", e),
            }),
        }
    }
}

impl AuditWriter for Ledger {
    /// Chain, hash and persist one record.
    ///
    /// Under `BestEffort` a store failure is logged and the computed record
    /// is returned with `persisted = false`; the head does not advance, so
    /// the next record links to the last record that was actually stored.
    /// Under `Strict` the failure is returned as `LedgerWriteFailed`.
    ///
    /// An unreadable head is treated the same way: the record is never
    /// inserted with a guessed predecessor.
    fn append(&self, draft: RecordDraft) -> OracleResult<AppendOutcome> {
        let mut head = self.head.lock().map_err(|e| OracleError::LedgerWriteFailed {
            reason: format!("chain head lock poisoned: {}", e),
        })?;

        let linked_to = self.current_head(&mut head)?;
        let draft = draft.normalized();

        let mut record = AuditRecord {
            question: draft.question,
            answer: draft.answer,
            kind: draft.kind,
            determinacy: draft.determinacy,
            deception_prob: draft.deception_prob,
            risk_tags: draft.risk_tags,
            language: draft.language,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            prev_hash: linked_to.clone().unwrap_or_default(),
            hash: String::new(),
        };
        record.hash = record_hash(&record)?;

        if linked_to.is_none() {
            warn!(hash = %record.hash, "chain head unknown; returning record unstored");
            return Ok(AppendOutcome {
                record,
                persisted: false,
            });
        }

        match self.store.insert(&record) {
            Ok(()) => {
                *head = Some(record.hash.clone());
                info!(
                    hash = %record.hash,
                    prev_hash = %record.prev_hash,
                    kind = %record.kind,
                    "record appended"
                );
                Ok(AppendOutcome {
                    record,
                    persisted: true,
                })
            }
            Err(e) => match self.durability {
                Durability::BestEffort => {
                    warn!(
                        hash = %record.hash,
                        error = %e,
                        "record could not be persisted; returning it unstored"
                    );
                    Ok(AppendOutcome {
                        record,
                        persisted: false,
                    })
                }
                Durability::Strict => Err(OracleError::LedgerWriteFailed {
                    reason: format!("record '{}' was not persisted: {}", record.hash, e),
                }),
            },
        }
    }
}
