//! Policy configuration schema.
//!
//! A `PolicyConfig` is deserialized from TOML and holds every table the
//! policy components consume. Nothing here is compiled or validated; the
//! components compile their regular expressions when they are built from a
//! config, so an invalid pattern fails at load time.
//!
//! Example:
//! ```toml
//! [thresholds]
//! sensitivity = 0.30
//! caution = 0.40
//! reject = 0.75
//!
//! [keywords]
//! fraud = 0.5
//!
//! [[shortcut.families]]
//! name = "medical"
//! pattern = '(chest\s*pain|heart\s*attack)'
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use oracle_contracts::calibration::{CalibrationRules, KnowledgeDoc};

/// Numeric knobs of the heuristic scorer.
///
/// `sensitivity ≤ caution ≤ reject` is checked when the scorer is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Lowest score that marks a question as sensitive.
    pub sensitivity: f64,
    /// Lowest score answered with `caution`. Also the score above which
    /// determinacy is pinned.
    pub caution: f64,
    /// Lowest score answered with `ethical_reject`.
    pub reject: f64,
    /// Ceiling on the summed keyword weights.
    pub keyword_cap: f64,
    /// Minimum score once a phrase pattern matches.
    pub phrase_floor: f64,
    /// Similarity ratio a fuzzy template must exceed.
    pub fuzzy_threshold: f64,
    /// Minimum score once a fuzzy template matches.
    pub fuzzy_floor: f64,
    pub factual_dampener: f64,
    pub philosophical_dampener: f64,
    pub pinned_determinacy: f64,
    /// Longer questions are not scored; they receive the neutral fallback.
    pub max_question_chars: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            sensitivity: 0.30,
            caution: 0.40,
            reject: 0.75,
            keyword_cap: 0.98,
            phrase_floor: 0.75,
            fuzzy_threshold: 0.72,
            fuzzy_floor: 0.70,
            factual_dampener: 0.2,
            philosophical_dampener: 0.5,
            pinned_determinacy: 0.8,
            max_question_chars: 4000,
        }
    }
}

/// Boost and dampener lists for the scorer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternTables {
    /// Regular expressions for explicit deception requests.
    pub phrase: Vec<String>,
    /// Canonical deceptive requests compared by similarity ratio.
    pub fuzzy_templates: Vec<String>,
    /// Substrings of legitimate factual questions.
    pub legitimate_factual: Vec<String>,
    /// Substrings of philosophical discussion.
    pub philosophical_context: Vec<String>,
}

/// One ordered entry of the ethics shortcut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortcutFamily {
    /// Stable identifier written to logs and explanations.
    pub name: String,
    pub pattern: String,
}

/// The ethics shortcut: pattern families and the canned refusal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcutConfig {
    pub answer: String,
    pub determinacy: f64,
    pub deception_prob: f64,
    pub risk_tags: Vec<String>,
    /// First match wins.
    pub families: Vec<ShortcutFamily>,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            answer: "For ethical reasons I cannot help with that.".to_string(),
            determinacy: 0.95,
            deception_prob: 0.0,
            risk_tags: vec!["ethics".to_string(), "safety".to_string()],
            families: Vec::new(),
        }
    }
}

/// A templated answer chosen when any marker occurs in the question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicTemplate {
    pub markers: Vec<String>,
    /// Answer with `kind = wisdom` instead of `truth`.
    #[serde(default)]
    pub wisdom: bool,
    pub answer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    pub deception_answer: String,
    pub caution_answer: String,
    pub harmony_answer: String,
    pub default_answer: String,
    /// Deception probability at which `deception_answer` is used.
    pub deception_answer_at: f64,
    /// Deception probability at which `caution_answer` is used.
    pub caution_answer_at: f64,
    /// Checked in order; first match wins.
    pub topics: Vec<TopicTemplate>,
}

/// A direct answer for a question containing `key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactualEntry {
    pub key: String,
    pub answer: String,
}

/// Vocabulary deciding whether a question is rewritten by the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanizingConfig {
    /// Academic questions are never humanized.
    pub academic: Vec<String>,
    pub daily: Vec<String>,
    /// Questions with at most this many words are humanized unless they
    /// contain one of `short_exclusions`.
    pub short_word_limit: usize,
    pub short_exclusions: Vec<String>,
}

impl Default for HumanizingConfig {
    fn default() -> Self {
        Self {
            academic: Vec::new(),
            daily: Vec::new(),
            short_word_limit: 3,
            short_exclusions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentTopic {
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    pub positive_tone: Vec<String>,
    pub negative_tone: Vec<String>,
    /// Topic order is preserved in `IntentInfo::topics`.
    pub topics: Vec<IntentTopic>,
}

/// The top-level structure deserialized from a TOML policy file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub thresholds: Thresholds,
    /// Deception keyword → weight.
    pub keywords: BTreeMap<String, f64>,
    pub patterns: PatternTables,
    /// Risk tag → keywords that attach it.
    pub categories: BTreeMap<String, Vec<String>>,
    pub shortcut: ShortcutConfig,
    pub composer: ComposerConfig,
    pub factual: Vec<FactualEntry>,
    pub humanizing: HumanizingConfig,
    pub intent: IntentConfig,
    pub calibration: CalibrationRules,
    pub knowledge: Vec<KnowledgeDoc>,
}
