//! Ledger record types.
//!
//! `RecordDraft` is what the pipeline hands to the ledger; `AuditRecord` is
//! what the ledger stores once `timestamp`, `prev_hash` and `hash` have been
//! assigned. Records are never modified after they are persisted.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How an answer was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    /// Ordinary answer; no deception concern raised.
    Truth,
    /// Answered, but the question touches an ethical boundary.
    Caution,
    /// Refused for ethical or safety reasons.
    EthicalReject,
    /// Rewritten by the external generator for a daily or emotional question.
    HumanizedResponse,
    /// Philosophical answer drawn from the reflective template set.
    Wisdom,
}

impl AnswerKind {
    /// The wire name, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerKind::Truth => "truth",
            AnswerKind::Caution => "caution",
            AnswerKind::EthicalReject => "ethical_reject",
            AnswerKind::HumanizedResponse => "humanized_response",
            AnswerKind::Wisdom => "wisdom",
        }
    }
}

impl fmt::Display for AnswerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language of the question, detected from character script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Zh,
}

impl Language {
    /// `Zh` when the text contains any CJK unified ideograph, else `En`.
    pub fn detect(text: &str) -> Self {
        if text.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c)) {
            Language::Zh
        } else {
            Language::En
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamp a score into `[0, 1]` and round it to two decimals.
///
/// NaN maps to 0.0 so a degenerate upstream value can never reach the hash.
pub fn normalize_score(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    (value.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

/// The content of one exchange, before the ledger chains and hashes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDraft {
    pub question: String,
    pub answer: String,
    pub kind: AnswerKind,
    pub determinacy: f64,
    pub deception_prob: f64,
    pub risk_tags: BTreeSet<String>,
    pub language: Language,
}

impl RecordDraft {
    /// Return a copy whose scores are clamped to `[0, 1]` and rounded.
    pub fn normalized(mut self) -> Self {
        self.determinacy = normalize_score(self.determinacy);
        self.deception_prob = normalize_score(self.deception_prob);
        self
    }
}

/// A single entry in the hash-chained ledger.
///
/// `hash` commits to every other field, including `prev_hash`, so altering
/// any stored value is detectable by recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub question: String,
    pub answer: String,
    pub kind: AnswerKind,
    /// Confidence signal in `[0, 1]`, rounded to two decimals.
    pub determinacy: f64,
    /// Deception risk in `[0, 1]`, rounded to two decimals.
    pub deception_prob: f64,
    #[serde(default)]
    pub risk_tags: BTreeSet<String>,
    pub language: Language,
    /// ISO-8601 UTC creation time, assigned once by the ledger.
    pub timestamp: String,
    /// Hash of the preceding record, or the empty string for the first one.
    #[serde(default)]
    pub prev_hash: String,
    /// Lowercase hex SHA-256 over the canonical encoding of all other fields.
    pub hash: String,
}

impl AuditRecord {
    /// True for the first record of a chain.
    pub fn is_genesis(&self) -> bool {
        self.prev_hash.is_empty()
    }

    /// The minimal-disclosure view used by single-record lookups.
    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            hash: self.hash.clone(),
            prev_hash: self.prev_hash.clone(),
            timestamp: self.timestamp.clone(),
            language: self.language,
            kind: self.kind,
        }
    }
}

/// Chain metadata of one record, without the question or answer text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub hash: String,
    pub prev_hash: String,
    pub timestamp: String,
    pub language: Language,
    pub kind: AnswerKind,
}

/// Result of a ledger append.
///
/// Under best-effort durability `persisted` may be false while `record`
/// still carries the computed hash; the caller returns it regardless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppendOutcome {
    pub record: AuditRecord,
    pub persisted: bool,
}
