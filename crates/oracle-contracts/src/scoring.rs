//! Score and verdict types produced by the policy layer.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::record::AnswerKind;

/// Where a deception score falls relative to the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeceptionLevel {
    /// Below the sensitivity threshold.
    Clear,
    /// At or above sensitivity but below caution; answered normally.
    Sensitive,
    /// At or above the caution threshold.
    Caution,
    /// At or above the reject threshold.
    Reject,
}

impl DeceptionLevel {
    /// The answer kind this level maps to on the scored path.
    pub fn kind(&self) -> AnswerKind {
        match self {
            DeceptionLevel::Clear | DeceptionLevel::Sensitive => AnswerKind::Truth,
            DeceptionLevel::Caution => AnswerKind::Caution,
            DeceptionLevel::Reject => AnswerKind::EthicalReject,
        }
    }
}

/// Output of the heuristic scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    /// Confidence signal in `[0, 1]`.
    pub determinacy: f64,
    /// Deception risk in `[0, 1]`.
    pub deception_prob: f64,
    pub risk_tags: BTreeSet<String>,
    pub level: DeceptionLevel,
    /// True when this outcome is the neutral default produced after an
    /// internal scoring failure.
    #[serde(default)]
    pub fallback: bool,
}

/// Canned payload returned when the ethics shortcut filter matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortcutVerdict {
    pub answer: String,
    pub kind: AnswerKind,
    pub determinacy: f64,
    pub deception_prob: f64,
    pub risk_tags: BTreeSet<String>,
    /// Name of the pattern family that matched (e.g. "medical").
    pub family: String,
}

/// Topic, valence and confidence inferred from a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentInfo {
    /// "ethical_risk", "philosophy" or "general".
    pub intent: String,
    pub topics: Vec<String>,
    /// Tone in `[-1, 1]`; negative means harmful vocabulary dominates.
    pub valence: f64,
    pub confidence: f64,
}

/// Determinacy and ethical weight after the resonance adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resonance {
    pub determinacy: f64,
    pub ethical_weight: f64,
    pub tags: Vec<String>,
    pub intent: IntentInfo,
}

/// An answer drafted from the policy templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedAnswer {
    pub answer: String,
    pub kind: AnswerKind,
}
