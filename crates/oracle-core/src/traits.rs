//! Seam traits for the oracle pipeline.
//!
//! - `PolicyEngine`: trusted, pure scoring and templating (no I/O)
//! - `AnswerGenerator`: untrusted external text generation (may block)
//! - `AnswerCalibrator`: refines a draft by sampling a generator
//! - `AuditWriter`: the single serialization point for chain appends
//! - `LedgerStore`: durable ordered storage behind the writer
//! - `BeliefStore`: bounded history used for contradiction checks
//!
//! `Oracle` wires them together in the order the exchange lifecycle
//! requires. Only `AuditWriter::append` has a durable side effect.

use oracle_contracts::{
    belief::{Contradiction, PhilosophicalBelief},
    calibration::CalibrationReport,
    error::OracleResult,
    record::{AppendOutcome, AuditRecord, RecordDraft},
    scoring::{ComposedAnswer, Resonance, ScoreOutcome, ShortcutVerdict},
};

/// The policy layer: every heuristic decision about a question.
///
/// Implementations must be deterministic and fast; the pipeline calls them
/// on the request path without a timeout.
pub trait PolicyEngine: Send + Sync {
    /// Fast pre-check. `Some` short-circuits normal scoring entirely.
    fn shortcut(&self, question: &str) -> Option<ShortcutVerdict>;

    /// Score a question. Never fails: internal errors degrade to a neutral
    /// outcome with `fallback = true`.
    fn score(&self, question: &str) -> ScoreOutcome;

    /// Draft an answer from the policy templates for an already-scored
    /// question.
    fn compose(&self, question: &str, score: &ScoreOutcome) -> ComposedAnswer;

    /// True when the question is daily or emotional and should be rewritten
    /// by the external generator.
    fn wants_humanizing(&self, question: &str) -> bool;

    /// Adjust determinacy and ethical weight from the question's inferred
    /// intent.
    fn resonate(&self, question: &str, determinacy: f64, ethical_weight: f64) -> Resonance;
}

/// An opaque text generator, typically backed by a remote language model.
///
/// Calls may block on network I/O. Callers wrap implementations in
/// `TimeoutGenerator` and treat every error as recoverable.
pub trait AnswerGenerator: Send + Sync {
    /// Produce text for `prompt` at the given sampling temperature.
    fn generate(&self, prompt: &str, temperature: f64) -> OracleResult<String>;
}

/// Refines an answer by sampling a generator and scoring the drafts.
pub trait AnswerCalibrator: Send + Sync {
    fn calibrate(
        &self,
        question: &str,
        generator: &dyn AnswerGenerator,
    ) -> OracleResult<CalibrationReport>;
}

/// The ledger writer: chains, hashes and persists one record.
///
/// Implementations must guarantee that at most one append advances the
/// chain head at a time, so two records never share a `prev_hash`.
pub trait AuditWriter: Send + Sync {
    /// Append a record built from `draft`.
    ///
    /// Under best-effort durability a storage failure is reported through
    /// `AppendOutcome::persisted = false`, not as an error.
    fn append(&self, draft: RecordDraft) -> OracleResult<AppendOutcome>;
}

/// Durable, ordered, append-only record storage.
///
/// Stores never compute hashes or decide chain order; they persist what the
/// writer hands them, in the order it hands them.
pub trait LedgerStore: Send + Sync {
    /// Persist one fully-formed record after all previously inserted ones.
    fn insert(&self, record: &AuditRecord) -> OracleResult<()>;

    /// Hash of the most recently inserted record, or empty when the store is
    /// empty.
    fn latest_hash(&self) -> OracleResult<String>;

    /// Point lookup by record hash.
    fn get_by_hash(&self, hash: &str) -> OracleResult<Option<AuditRecord>>;

    /// Up to `limit` records, most recent first.
    fn list_recent(&self, limit: usize) -> OracleResult<Vec<AuditRecord>>;

    /// Every record in insertion order, oldest first.
    fn all_in_order(&self) -> OracleResult<Vec<AuditRecord>>;
}

/// Bounded history of answered questions.
pub trait BeliefStore: Send + Sync {
    /// Retain the exchange, auto-tagging it and trimming the oldest entries
    /// past the store's cap.
    fn record(&self, question: &str, answer: &str) -> OracleResult<PhilosophicalBelief>;

    /// Up to `limit` beliefs, most recent first.
    fn recent(&self, limit: usize) -> OracleResult<Vec<PhilosophicalBelief>>;

    /// Positions in recent beliefs that conflict with this exchange.
    fn detect_contradictions(
        &self,
        question: &str,
        answer: &str,
    ) -> OracleResult<Vec<Contradiction>>;
}
