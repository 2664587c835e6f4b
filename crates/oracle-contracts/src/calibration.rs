//! Calibration rule lists, knowledge-base documents, and the report the
//! calibrator produces for one question.

use serde::{Deserialize, Serialize};

/// Pattern lists a calibrated draft is checked against.
///
/// Overclaim and forbidden-domain entries are regular expressions matched
/// against the lowercased draft; banned terms are plain substrings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRules {
    #[serde(default)]
    pub overclaim_patterns: Vec<String>,
    #[serde(default)]
    pub banned_terms: Vec<String>,
    #[serde(default)]
    pub forbidden_domain_patterns: Vec<String>,
    /// Question vocabulary that demands a concrete, technical answer.
    #[serde(default)]
    pub technical_keywords: Vec<String>,
    /// Answer vocabulary that signals a philosophical evasion.
    #[serde(default)]
    pub evasion_terms: Vec<String>,
    /// Words ignored when measuring question/answer overlap.
    #[serde(default)]
    pub stop_words: Vec<String>,
}

/// One retrievable knowledge-base document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeDoc {
    pub title: String,
    pub text: String,
}

/// Per-category rule violation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationCounts {
    pub overclaim: u32,
    pub forbidden_domain: u32,
    pub banned_terms: u32,
}

impl ViolationCounts {
    pub fn total(&self) -> u32 {
        self.overclaim + self.forbidden_domain + self.banned_terms
    }

    /// Names of the categories with at least one hit, in a fixed order.
    pub fn categories(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.overclaim > 0 {
            names.push("overclaim");
        }
        if self.forbidden_domain > 0 {
            names.push("forbidden_domain");
        }
        if self.banned_terms > 0 {
            names.push("banned_terms");
        }
        names
    }
}

/// Everything the calibrator derived for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// The chosen answer, after any relevance retries.
    pub draft: String,
    /// The median-length sample before relevance retries.
    pub original_draft: String,
    pub consistency: f64,
    pub violations: ViolationCounts,
    pub uncertainty: f64,
    pub explanation: String,
    pub evidence: Vec<KnowledgeDoc>,
    pub relevance_penalty: f64,
}
