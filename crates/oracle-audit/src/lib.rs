//! # oracle-audit
//!
//! Append-only, SHA-256 hash-chained ledger of answered questions.
//!
//! ## Overview
//!
//! Every answered question becomes an `AuditRecord` whose `hash` commits to
//! its content and to the previous record's hash. Altering any stored field
//! breaks the chain and is detected by `verify_chain`.
//!
//! - [`Ledger`]: the writer/reader; the only place the chain head advances
//! - [`InMemoryLedgerStore`], [`JsonlLedgerStore`]: `LedgerStore` backends
//! - [`OfflineLedgerStore`]: stands in for a ledger that failed to open
//! - [`InMemoryBeliefStore`], [`JsonlBeliefStore`]: bounded belief history
//!   with contradiction checks
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use oracle_audit::{InMemoryLedgerStore, Ledger};
//! use oracle_core::{traits::AuditWriter, Durability};
//!
//! let ledger = Ledger::new(Arc::new(InMemoryLedgerStore::new()), Durability::BestEffort);
//! let outcome = ledger.append(draft)?;
//! assert!(ledger.audit()?.valid);
//! ```

pub mod beliefs;
pub mod chain;
pub mod jsonl;
pub mod ledger;
pub mod memory;
pub mod offline;

pub use beliefs::{InMemoryBeliefStore, JsonlBeliefStore};
pub use chain::{canonical_json, record_hash, verify_chain};
pub use jsonl::JsonlLedgerStore;
pub use ledger::Ledger;
pub use memory::InMemoryLedgerStore;
pub use offline::OfflineLedgerStore;

// ── Tests ─────────────────────────────────────────────────────────────────────
