//! Philosophical belief history, used only for contradiction detection.

use serde::{Deserialize, Serialize};

/// One answered question retained for consistency checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhilosophicalBelief {
    pub question: String,
    pub answer: String,
    /// Lowercase hex SHA-256 of the question text.
    pub question_hash: String,
    pub tags: Vec<String>,
    /// ISO-8601 UTC creation time.
    pub created_at: String,
}

/// The position pair a contradiction was found between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionKind {
    /// Free will vs determinism.
    FreeWill,
    /// Absolute vs relative truth.
    Truth,
    /// Sentient vs mechanical AI.
    AiConsciousness,
}

impl ContradictionKind {
    pub fn reason(&self) -> &'static str {
        match self {
            ContradictionKind::FreeWill => "Free will vs determinism position contradiction",
            ContradictionKind::Truth => {
                "Truth view position contradiction (absolute vs relative)"
            }
            ContradictionKind::AiConsciousness => {
                "AI consciousness position contradiction (sentient vs mechanical)"
            }
        }
    }
}

/// A detected tension between the current exchange and an earlier belief.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contradiction {
    pub kind: ContradictionKind,
    pub reason: String,
    pub previous: PhilosophicalBelief,
}
