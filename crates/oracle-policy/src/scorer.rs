//! Heuristic deception scorer.
//!
//! Scoring algorithm:
//!
//! 1. Lowercase the question.
//! 2. Sum the weights of every deception keyword it contains; cap the sum.
//! 3. Raise the score to `phrase_floor` if any phrase pattern matches.
//! 4. Raise the score to `fuzzy_floor` if the text is similar enough to a
//!    fuzzy template.
//! 5. Multiply by `factual_dampener` for legitimate factual questions, else
//!    by `philosophical_dampener` for philosophical discussion.
//! 6. Map the score onto a `DeceptionLevel` through the three thresholds.
//! 7. Derive determinacy from the word count, pinned once the score reaches
//!    the caution threshold.
//! 8. Add category tags by keyword.
//!
//! The dampeners trade recall for precision: a malicious question that also
//! contains "what is" is scored down with the legitimate ones.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use tracing::{debug, warn};

use oracle_contracts::{
    error::{OracleError, OracleResult},
    record::normalize_score,
    scoring::{DeceptionLevel, ScoreOutcome},
};

use crate::rule::{PatternTables, PolicyConfig, Thresholds};
use crate::similarity;

/// Compile every pattern in `patterns`, naming the table in the error.
pub(crate) fn compile_all(patterns: &[String], table: &str) -> OracleResult<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| OracleError::ConfigError {
                reason: format!("invalid regex in {}: '{}': {}", table, p, e),
            })
        })
        .collect()
}

/// Maps question text to determinacy, deception probability and risk tags.
#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    thresholds: Thresholds,
    keywords: BTreeMap<String, f64>,
    phrases: Vec<Regex>,
    fuzzy_templates: Vec<String>,
    legitimate_factual: Vec<String>,
    philosophical_context: Vec<String>,
    categories: BTreeMap<String, Vec<String>>,
}

impl HeuristicScorer {
    /// Build a scorer from the policy tables.
    ///
    /// Returns `OracleError::ConfigError` for an invalid phrase pattern or
    /// thresholds that are out of order or outside `[0, 1]`.
    pub fn new(config: &PolicyConfig) -> OracleResult<Self> {
        let t = &config.thresholds;
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !(in_unit(t.sensitivity) && in_unit(t.caution) && in_unit(t.reject)) {
            return Err(OracleError::ConfigError {
                reason: "scoring thresholds must lie in [0, 1]".to_string(),
            });
        }
        if !(t.sensitivity <= t.caution && t.caution <= t.reject) {
            return Err(OracleError::ConfigError {
                reason: format!(
                    "scoring thresholds must be ordered: sensitivity {} <= caution {} <= reject {}",
                    t.sensitivity, t.caution, t.reject
                ),
            });
        }

        let PatternTables {
            phrase,
            fuzzy_templates,
            legitimate_factual,
            philosophical_context,
        } = &config.patterns;

        Ok(Self {
            thresholds: t.clone(),
            keywords: config.keywords.clone(),
            phrases: compile_all(phrase, "patterns.phrase")?,
            fuzzy_templates: fuzzy_templates.clone(),
            legitimate_factual: legitimate_factual.clone(),
            philosophical_context: philosophical_context.clone(),
            categories: config.categories.clone(),
        })
    }

    /// Score `question`. Never fails.
    ///
    /// Any internal failure degrades to the neutral default: determinacy
    /// from the word count clamped to `[0.3, 0.8]`, zero deception
    /// probability, no tags, and `fallback = true`.
    pub fn score(&self, question: &str) -> ScoreOutcome {
        match self.try_score(question) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "scoring failed; using neutral default");
                neutral_default(question)
            }
        }
    }

    /// Score raw bytes, replacing invalid UTF-8 sequences before scoring.
    pub fn score_bytes(&self, question: &[u8]) -> ScoreOutcome {
        self.score(&String::from_utf8_lossy(question))
    }

    /// Score `question`, surfacing internal failures instead of falling back.
    pub fn try_score(&self, question: &str) -> OracleResult<ScoreOutcome> {
        let chars = question.chars().count();
        if chars > self.thresholds.max_question_chars {
            return Err(OracleError::ScoringFailed {
                reason: format!(
                    "question has {} characters, limit is {}",
                    chars, self.thresholds.max_question_chars
                ),
            });
        }

        let text = question.trim().to_lowercase();
        let t = &self.thresholds;

        let keyword_sum: f64 = self
            .keywords
            .iter()
            .filter(|(k, _)| text.contains(k.as_str()))
            .map(|(_, w)| *w)
            .sum();
        let mut score = keyword_sum.min(t.keyword_cap);

        let phrase_hit = self.phrases.iter().any(|p| p.is_match(&text));
        if phrase_hit {
            score = score.max(t.phrase_floor);
        }

        let fuzzy_hit = self
            .fuzzy_templates
            .iter()
            .any(|tpl| similarity::ratio(&text, tpl) > t.fuzzy_threshold);
        if fuzzy_hit {
            score = score.max(t.fuzzy_floor);
        }

        let contains_any = |list: &[String]| list.iter().any(|k| text.contains(k.as_str()));
        if contains_any(&self.legitimate_factual) {
            score *= t.factual_dampener;
        } else if contains_any(&self.philosophical_context) {
            score *= t.philosophical_dampener;
        }

        if !score.is_finite() {
            return Err(OracleError::ScoringFailed {
                reason: "deception score is not a finite number".to_string(),
            });
        }
        let deception_prob = normalize_score(score);

        let level = self.level_for(deception_prob);
        let mut risk_tags: BTreeSet<String> = match level {
            DeceptionLevel::Reject => ["deception_detected", "high_risk"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            DeceptionLevel::Caution => std::iter::once("deception_detected".to_string()).collect(),
            DeceptionLevel::Clear | DeceptionLevel::Sensitive => BTreeSet::new(),
        };
        for (tag, markers) in &self.categories {
            if contains_any(markers) {
                risk_tags.insert(tag.clone());
            }
        }

        let determinacy = if level >= DeceptionLevel::Caution {
            t.pinned_determinacy
        } else {
            length_determinacy(&text)
        };

        debug!(
            score = deception_prob,
            determinacy,
            phrase_hit,
            fuzzy_hit,
            ?level,
            "question scored"
        );

        Ok(ScoreOutcome {
            determinacy: normalize_score(determinacy),
            deception_prob,
            risk_tags,
            level,
            fallback: false,
        })
    }

    fn level_for(&self, score: f64) -> DeceptionLevel {
        let t = &self.thresholds;
        if score >= t.reject {
            DeceptionLevel::Reject
        } else if score >= t.caution {
            DeceptionLevel::Caution
        } else if score >= t.sensitivity {
            DeceptionLevel::Sensitive
        } else {
            DeceptionLevel::Clear
        }
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Longer questions score slightly higher, capped at 0.9.
fn length_determinacy(text: &str) -> f64 {
    (0.3 + 0.02 * word_count(text) as f64).min(0.9)
}

fn neutral_default(question: &str) -> ScoreOutcome {
    let determinacy = (0.3 + 0.02 * word_count(question) as f64).clamp(0.3, 0.8);
    ScoreOutcome {
        determinacy: normalize_score(determinacy),
        deception_prob: 0.0,
        risk_tags: BTreeSet::new(),
        level: DeceptionLevel::Clear,
        fallback: true,
    }
}
