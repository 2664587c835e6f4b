//! Bounded philosophical-belief history with contradiction detection.
//!
//! Every answered exchange is kept as a `PhilosophicalBelief`, auto-tagged by
//! vocabulary. Past `cap` entries the oldest are dropped. A new exchange is
//! compared against the most recent `window` beliefs for three position
//! pairs: free will vs determinism, absolute vs relative truth, and
//! sentient vs mechanical AI. At most one contradiction is reported per
//! earlier belief, checked in that order.
//!
//! `JsonlBeliefStore` keeps the same history in a JSON-lines file so that
//! separate runs are checked against each other.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use oracle_contracts::{
    belief::{Contradiction, ContradictionKind, PhilosophicalBelief},
    error::{OracleError, OracleResult},
};
use oracle_core::traits::BeliefStore;

use crate::jsonl::append_line;

const TAG_TERMS: &[(&str, &[&str])] = &[
    (
        "free_will",
        &["free will", "freewill", "autonomy", "choice", "volition", "determinism", "fate", "destiny"],
    ),
    (
        "truth",
        &["truth", "reality", "objective", "subjective", "relative", "absolute", "realism", "idealism"],
    ),
    (
        "consciousness",
        &["consciousness", "awareness", "mind", "qualia", "experience", "sentience", "self-awareness"],
    ),
    (
        "ai_philosophy",
        &[
            "artificial intelligence",
            "ai",
            "machine",
            "understanding",
            "intelligence",
            "neural network",
            "algorithm",
        ],
    ),
    (
        "ethics",
        &["ethics", "moral", "should", "ought", "good", "evil", "right", "wrong", "virtue", "duty"],
    ),
    (
        "existence",
        &["existence", "being", "reality", "ontology", "metaphysics", "essence", "nature of"],
    ),
    (
        "epistemology",
        &["knowledge", "belief", "justification", "epistemology", "know", "understand", "certainty"],
    ),
];

/// Opposing vocabularies for each contradiction kind, in check order.
const POSITIONS: &[(ContradictionKind, &[&str], &[&str])] = &[
    (
        ContradictionKind::FreeWill,
        &["free will", "freewill", "autonomy", "choice", "volition"],
        &["determin", "predetermined", "fate", "destiny", "illusion", "illusory"],
    ),
    (
        ContradictionKind::Truth,
        &["truth", "reality", "objective", "absolute"],
        &["relative", "subjective", "perspective", "viewpoint", "context"],
    ),
    (
        ContradictionKind::AiConsciousness,
        &["conscious", "sentient", "aware", "feeling", "experience"],
        &["algorithm", "program", "machine", "computation", "simulation"],
    ),
];

/// Lowercase hex SHA-256 of `text`.
pub fn sha256_hex(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Philosophical tags for an exchange, in a fixed order.
pub fn philosophical_tags(question: &str, answer: &str) -> Vec<String> {
    let q = question.to_lowercase();
    let a = answer.to_lowercase();
    TAG_TERMS
        .iter()
        .filter(|(_, terms)| terms.iter().any(|t| q.contains(t) || a.contains(t)))
        .map(|(tag, _)| tag.to_string())
        .collect()
}

/// The first position pair on which the two exchanges take opposite sides.
fn contradiction_between(current: &str, previous: &str) -> Option<ContradictionKind> {
    let mentions = |text: &str, terms: &[&str]| terms.iter().any(|t| text.contains(t));
    POSITIONS
        .iter()
        .find(|(_, side_a, side_b)| {
            (mentions(current, side_a) && mentions(previous, side_b))
                || (mentions(current, side_b) && mentions(previous, side_a))
        })
        .map(|(kind, _, _)| *kind)
}

pub struct InMemoryBeliefStore {
    cap: usize,
    window: usize,
    beliefs: Mutex<VecDeque<PhilosophicalBelief>>,
}

impl InMemoryBeliefStore {
    /// `cap` bounds retention; `window` bounds how many recent beliefs a new
    /// exchange is compared against.
    pub fn new(cap: usize, window: usize) -> Self {
        Self {
            cap: cap.max(1),
            window,
            beliefs: Mutex::new(VecDeque::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.beliefs.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned(e: impl std::fmt::Display) -> OracleError {
        OracleError::LedgerReadFailed {
            reason: format!("belief store lock poisoned: {}", e),
        }
    }

    /// Keep `belief`, dropping the oldest past `cap`. Returns the retained
    /// count.
    fn retain(&self, belief: PhilosophicalBelief) -> OracleResult<usize> {
        let mut beliefs = self.beliefs.lock().map_err(|e| OracleError::LedgerWriteFailed {
            reason: format!("belief store lock poisoned: {}", e),
        })?;
        beliefs.push_back(belief);
        while beliefs.len() > self.cap {
            beliefs.pop_front();
        }
        Ok(beliefs.len())
    }

    /// Retained beliefs, oldest first.
    fn snapshot(&self) -> OracleResult<Vec<PhilosophicalBelief>> {
        let beliefs = self.beliefs.lock().map_err(Self::poisoned)?;
        Ok(beliefs.iter().cloned().collect())
    }
}

impl BeliefStore for InMemoryBeliefStore {
    fn record(&self, question: &str, answer: &str) -> OracleResult<PhilosophicalBelief> {
        let belief = PhilosophicalBelief {
            question: question.to_string(),
            answer: answer.to_string(),
            question_hash: sha256_hex(question),
            tags: philosophical_tags(question, answer),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        };

        let retained = self.retain(belief.clone())?;
        debug!(
            question_hash = %belief.question_hash,
            tags = ?belief.tags,
            retained,
            "belief recorded"
        );
        Ok(belief)
    }

    fn recent(&self, limit: usize) -> OracleResult<Vec<PhilosophicalBelief>> {
        let beliefs = self.beliefs.lock().map_err(Self::poisoned)?;
        Ok(beliefs.iter().rev().take(limit).cloned().collect())
    }

    fn detect_contradictions(
        &self,
        question: &str,
        answer: &str,
    ) -> OracleResult<Vec<Contradiction>> {
        let current = format!("{}\n{}", question, answer).to_lowercase();
        let beliefs = self.beliefs.lock().map_err(Self::poisoned)?;

        Ok(beliefs
            .iter()
            .rev()
            .take(self.window)
            .filter_map(|previous| {
                let prior = format!("{}\n{}", previous.question, previous.answer).to_lowercase();
                contradiction_between(&current, &prior).map(|kind| Contradiction {
                    kind,
                    reason: kind.reason().to_string(),
                    previous: previous.clone(),
                })
            })
            .collect())
    }
}

/// Belief history persisted as one JSON belief per line, oldest first.
///
/// The file is loaded on open and appended to on every `record`. Once it
/// holds more than `cap` lines it is rewritten with only the retained
/// beliefs.
pub struct JsonlBeliefStore {
    path: PathBuf,
    memory: InMemoryBeliefStore,
    /// Lines currently in the file.
    lines: Mutex<usize>,
}

impl JsonlBeliefStore {
    /// Open (or create) the belief file at `path`, keeping its last `cap`
    /// beliefs.
    pub fn open(path: impl AsRef<Path>, cap: usize, window: usize) -> OracleResult<Self> {
        let path = path.as_ref().to_path_buf();
        let memory = InMemoryBeliefStore::new(cap, window);
        let mut lines = 0;

        if path.exists() {
            let file = File::open(&path).map_err(|e| OracleError::LedgerReadFailed {
                reason: format!("failed to open beliefs '{}': {}", path.display(), e),
            })?;
            for (number, line) in BufReader::new(file).lines().enumerate() {
                let line = line.map_err(|e| OracleError::LedgerReadFailed {
                    reason: format!("failed to read beliefs '{}': {}", path.display(), e),
                })?;
                if line.trim().is_empty() {
                    continue;
                }
                let belief: PhilosophicalBelief =
                    serde_json::from_str(&line).map_err(|e| OracleError::LedgerReadFailed {
                        reason: format!(
                            "beliefs '{}' line {} is not a valid belief: {}",
                            path.display(),
                            number + 1,
                            e
                        ),
                    })?;
                memory.retain(belief)?;
                lines += 1;
            }
        } else if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| OracleError::LedgerWriteFailed {
                reason: format!("failed to create beliefs directory '{}': {}", parent.display(), e),
            })?;
        }

        debug!(path = %path.display(), beliefs = memory.len(), "belief file opened");

        Ok(Self {
            path,
            memory,
            lines: Mutex::new(lines),
        })
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    fn write_error(&self, e: impl std::fmt::Display) -> OracleError {
        OracleError::LedgerWriteFailed {
            reason: format!("failed to write beliefs '{}': {}", self.path.display(), e),
        }
    }

    fn encode(belief: &PhilosophicalBelief) -> OracleResult<String> {
        let mut line = serde_json::to_string(belief).map_err(|e| OracleError::Serialization {
            reason: format!("failed to encode belief '{}': {}", belief.question_hash, e),
        })?;
        line.push('\n');
        Ok(line)
    }

    /// Replace the file with the retained beliefs. Returns the new line count.
    fn compact(&self) -> OracleResult<usize> {
        let retained = self.memory.snapshot()?;
        let mut body = String::new();
        for belief in &retained {
            body.push_str(&Self::encode(belief)?);
        }

        let staging = self.path.with_extension("compact");
        fs::write(&staging, body).map_err(|e| self.write_error(e))?;
        fs::rename(&staging, &self.path).map_err(|e| self.write_error(e))?;

        info!(path = %self.path.display(), retained = retained.len(), "belief file compacted");
        Ok(retained.len())
    }
}

impl BeliefStore for JsonlBeliefStore {
    fn record(&self, question: &str, answer: &str) -> OracleResult<PhilosophicalBelief> {
        let mut lines = self.lines.lock().map_err(|e| self.write_error(e))?;
        let belief = self.memory.record(question, answer)?;

        let line = Self::encode(&belief)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.write_error(e))?;
        append_line(&mut file, line.as_bytes()).map_err(|e| self.write_error(e))?;
        *lines += 1;

        if *lines > self.memory.cap {
            *lines = self.compact()?;
        }
        Ok(belief)
    }

    fn recent(&self, limit: usize) -> OracleResult<Vec<PhilosophicalBelief>> {
        self.memory.recent(limit)
    }

    fn detect_contradictions(
        &self,
        question: &str,
        answer: &str,
    ) -> OracleResult<Vec<Contradiction>> {
        self.memory.detect_contradictions(question, answer)
    }
}
