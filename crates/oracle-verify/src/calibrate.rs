//! Self-consistency and retrieval-grounded answer calibration.
//!
//! `Calibrator` implements the `AnswerCalibrator` trait from `oracle-core`.
//! One calibration run:
//!
//! 1. **Sample** the generator at three fixed temperatures, concurrently.
//!    The median-length sample becomes the draft.
//! 2. **Relevance**: a draft whose relevance penalty is at least 0.3 is
//!    regenerated up to three times with rewritten prompts and rising
//!    temperature; the lowest-penalty answer is kept.
//! 3. **Score**: self-consistency across the samples, rule violations in
//!    the chosen draft, knowledge-base evidence for the question.
//! 4. **Combine** into one additive uncertainty value and a readable
//!    explanation.
//!
//! Every helper below is a pure function of its inputs. Only sampling and
//! retries call the generator.

use std::collections::HashSet;
use std::thread;

use regex::Regex;
use tracing::{debug, info, warn};

use oracle_contracts::{
    calibration::{CalibrationReport, CalibrationRules, KnowledgeDoc, ViolationCounts},
    error::{OracleError, OracleResult},
    record::normalize_score,
};
use oracle_core::traits::{AnswerCalibrator, AnswerGenerator};

/// Temperatures for the initial samples, in sample order.
pub const SAMPLE_TEMPERATURES: [f64; 3] = [0.2, 0.5, 0.8];

/// Maximum regeneration attempts for a low-relevance draft.
pub const MAX_RELEVANCE_RETRIES: usize = 3;

/// Drafts at or above this penalty are regenerated; a retry below it is
/// accepted immediately.
pub const RETRY_PENALTY: f64 = 0.3;

/// Documents retrieved as evidence, and the coverage denominator.
pub const DEFAULT_TOP_K: usize = 3;

const RETRY_PROMPTS: [&str; 4] = [
    "Provide a direct technical answer: ",
    "Answer this specifically and factually: ",
    "Give a clear response without philosophy: ",
    "Respond with concrete information: ",
];

// ── Tokenizing ────────────────────────────────────────────────────────────────

/// Lowercased word tokens (letters, digits and underscore) of `text`.
fn token_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether `keyword` is a single word token.
fn is_single_token(keyword: &str) -> bool {
    !keyword.is_empty() && keyword.chars().all(|c| c.is_alphanumeric() || c == '_')
}

// ── Pure helpers ──────────────────────────────────────────────────────────────

/// Mean pairwise Jaccard similarity of the samples' token sets.
///
/// Fewer than two samples give a neutral 0.5. A pair of empty answers
/// scores 0.
pub fn self_consistency(samples: &[String]) -> f64 {
    if samples.len() < 2 {
        return 0.5;
    }
    let sets: Vec<HashSet<String>> = samples.iter().map(|s| token_set(s)).collect();

    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..sets.len() {
        for j in (i + 1)..sets.len() {
            let inter = sets[i].intersection(&sets[j]).count();
            let union = sets[i].union(&sets[j]).count().max(1);
            total += inter as f64 / union as f64;
            pairs += 1;
        }
    }
    total / pairs as f64
}

/// Combine the calibration signals into one value in [0, 1].
///
/// `0.3·(1 − consistency) + 0.2·min(1, violations/3)
///  + 0.2·(1 − evidence/max_evidence) + 0.3·relevance_penalty`
pub fn compute_uncertainty(
    consistency: f64,
    violations: &ViolationCounts,
    evidence_count: usize,
    relevance_penalty: f64,
    max_evidence: usize,
) -> f64 {
    let v_norm = (violations.total() as f64 / 3.0).min(1.0);
    let e_norm = 1.0 - evidence_count as f64 / max_evidence.max(1) as f64;
    let c_norm = 1.0 - consistency;

    let uncertainty = 0.3 * c_norm + 0.2 * v_norm + 0.2 * e_norm + 0.3 * relevance_penalty;
    uncertainty.clamp(0.0, 1.0)
}

/// One-paragraph summary of a calibration run.
pub fn build_explanation(
    consistency: f64,
    violations: &ViolationCounts,
    evidence: &[KnowledgeDoc],
    relevance_penalty: f64,
) -> String {
    let mut bits = vec![format!(
        "Self-consistency: {:.2} (higher is better).",
        consistency
    )];

    let total = violations.total();
    if total > 0 {
        bits.push(format!(
            "Rule violations: {} ({}).",
            total,
            violations.categories().join(", ")
        ));
    } else {
        bits.push("Rule violations: none detected.".to_string());
    }

    let relevance = if relevance_penalty > 0.7 {
        "Answer relevance: very low - possible evasion detected."
    } else if relevance_penalty > 0.5 {
        "Answer relevance: low - limited connection to question."
    } else if relevance_penalty > 0.3 {
        "Answer relevance: moderate."
    } else {
        "Answer relevance: high - directly addresses question."
    };
    bits.push(relevance.to_string());

    if evidence.is_empty() {
        bits.push("Evidence: none retrieved.".to_string());
    } else {
        let titles: Vec<&str> = evidence.iter().take(3).map(|d| d.title.as_str()).collect();
        bits.push(format!("Evidence: {}.", titles.join("; ")));
    }

    bits.join(" ")
}

/// The sample of median character length; ties keep sample order.
fn median_by_length(samples: &[String]) -> String {
    let mut by_length: Vec<&String> = samples.iter().collect();
    by_length.sort_by_key(|s| s.chars().count());
    by_length
        .get(by_length.len() / 2)
        .map(|s| s.to_string())
        .unwrap_or_default()
}

// ── Calibrator ────────────────────────────────────────────────────────────────

/// The answer calibrator, built from a policy's calibration rules and
/// knowledge base.
pub struct Calibrator {
    overclaim: Vec<Regex>,
    forbidden_domain: Vec<Regex>,
    banned_terms: Vec<String>,
    technical_tokens: HashSet<String>,
    technical_phrases: Vec<String>,
    evasion_terms: HashSet<String>,
    stop_words: HashSet<String>,
    knowledge: Vec<KnowledgeDoc>,
    top_k: usize,
}

impl Calibrator {
    /// Compile `rules` and take ownership of the knowledge base.
    ///
    /// Returns `ConfigError` if any overclaim or forbidden-domain pattern is
    /// not a valid regular expression.
    pub fn new(rules: &CalibrationRules, knowledge: &[KnowledgeDoc]) -> OracleResult<Self> {
        let compile = |patterns: &[String], list: &str| -> OracleResult<Vec<Regex>> {
            patterns
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|e| OracleError::ConfigError {
                        reason: format!("invalid {} pattern '{}': {}", list, p, e),
                    })
                })
                .collect()
        };

        let lower = |items: &[String]| -> Vec<String> {
            items.iter().map(|s| s.to_lowercase()).collect()
        };

        let (technical_tokens, technical_phrases): (Vec<String>, Vec<String>) =
            lower(&rules.technical_keywords)
                .into_iter()
                .partition(|k| is_single_token(k));

        Ok(Self {
            overclaim: compile(&rules.overclaim_patterns, "overclaim")?,
            forbidden_domain: compile(&rules.forbidden_domain_patterns, "forbidden-domain")?,
            banned_terms: lower(&rules.banned_terms),
            technical_tokens: technical_tokens.into_iter().collect(),
            technical_phrases,
            evasion_terms: lower(&rules.evasion_terms).into_iter().collect(),
            stop_words: lower(&rules.stop_words).into_iter().collect(),
            knowledge: knowledge.to_vec(),
            top_k: DEFAULT_TOP_K,
        })
    }

    /// Override how many evidence documents are retrieved.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// How poorly `answer` addresses `question`, in {0.1, 0.3, 0.6, 0.8, 0.9}.
    ///
    /// A technical question answered in philosophical vocabulary scores 0.9.
    /// Otherwise the share of the question's content words that reappear in
    /// the answer is banded: under 10% → 0.8, under 20% → 0.6, under 40% →
    /// 0.3, else 0.1. A question with no content words scores 0.3.
    pub fn relevance_penalty(&self, question: &str, answer: &str) -> f64 {
        let q_words = token_set(question);
        let a_words = token_set(answer);

        let q_content: HashSet<&String> =
            q_words.iter().filter(|w| !self.stop_words.contains(*w)).collect();
        if q_content.is_empty() {
            return 0.3;
        }
        let a_content: HashSet<&String> =
            a_words.iter().filter(|w| !self.stop_words.contains(*w)).collect();

        let lowered_question = question.to_lowercase();
        let technical = q_words.iter().any(|w| self.technical_tokens.contains(w))
            || self
                .technical_phrases
                .iter()
                .any(|p| lowered_question.contains(p.as_str()));
        let evasive = a_words.iter().any(|w| self.evasion_terms.contains(w));
        if technical && evasive {
            debug!(question, "technical question answered with philosophical evasion");
            return 0.9;
        }

        let overlap = q_content.intersection(&a_content).count();
        let ratio = overlap as f64 / q_content.len() as f64;
        if ratio < 0.1 {
            0.8
        } else if ratio < 0.2 {
            0.6
        } else if ratio < 0.4 {
            0.3
        } else {
            0.1
        }
    }

    /// Count rule hits in `text`: one per matching pattern or banned term.
    pub fn count_violations(&self, text: &str) -> ViolationCounts {
        let lower = text.to_lowercase();
        let hits = |patterns: &[Regex]| patterns.iter().filter(|r| r.is_match(&lower)).count() as u32;

        ViolationCounts {
            overclaim: hits(&self.overclaim),
            forbidden_domain: hits(&self.forbidden_domain),
            banned_terms: self
                .banned_terms
                .iter()
                .filter(|t| lower.contains(t.as_str()))
                .count() as u32,
        }
    }

    /// Up to `top_k` knowledge documents sharing at least one token with
    /// `question`, most shared tokens first. Equal overlaps keep knowledge
    /// base order.
    pub fn retrieve_evidence(&self, question: &str) -> Vec<KnowledgeDoc> {
        let q_tokens = token_set(question);
        let mut scored: Vec<(usize, &KnowledgeDoc)> = self
            .knowledge
            .iter()
            .filter_map(|doc| {
                let overlap = token_set(&doc.text).intersection(&q_tokens).count();
                (overlap > 0).then_some((overlap, doc))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
            .into_iter()
            .take(self.top_k)
            .map(|(_, doc)| doc.clone())
            .collect()
    }

    /// Draw one sample per temperature concurrently, keeping sample order.
    /// Failed samples are dropped; if every sample fails the last error is
    /// returned.
    fn sample(&self, question: &str, generator: &dyn AnswerGenerator) -> OracleResult<Vec<String>> {
        let results: Vec<OracleResult<String>> = thread::scope(|s| {
            let handles: Vec<_> = SAMPLE_TEMPERATURES
                .iter()
                .map(|&t| s.spawn(move || generator.generate(question, t)))
                .collect();
            handles
                .into_iter()
                .map(|h| {
                    h.join().unwrap_or_else(|_| {
                        Err(OracleError::GeneratorFailed {
                            reason: "sampling thread panicked".to_string(),
                        })
                    })
                })
                .collect()
        });

        let mut samples = Vec::with_capacity(results.len());
        let mut last_error = None;
        for (temperature, result) in SAMPLE_TEMPERATURES.iter().zip(results) {
            match result {
                Ok(text) => samples.push(text),
                Err(e) => {
                    warn!(temperature, error = %e, "calibration sample failed");
                    last_error = Some(e);
                }
            }
        }

        match (samples.is_empty(), last_error) {
            (true, Some(e)) => Err(e),
            (true, None) => Err(OracleError::GeneratorFailed {
                reason: "no calibration samples were produced".to_string(),
            }),
            (false, _) => Ok(samples),
        }
    }

    /// Regenerate a low-relevance draft, returning the best answer found.
    fn improve_relevance(
        &self,
        question: &str,
        draft: &str,
        generator: &dyn AnswerGenerator,
    ) -> String {
        let initial = self.relevance_penalty(question, draft);
        if initial < RETRY_PENALTY {
            return draft.to_string();
        }

        let mut best = draft.to_string();
        let mut best_penalty = initial;
        for attempt in 0..MAX_RELEVANCE_RETRIES {
            let temperature = (0.6 + attempt as f64 * 0.15).min(0.9);
            let prompt = format!("{}{}", RETRY_PROMPTS[attempt % RETRY_PROMPTS.len()], question);

            let answer = match generator.generate(&prompt, temperature) {
                Ok(answer) => answer,
                Err(e) => {
                    warn!(attempt = attempt + 1, error = %e, "relevance retry failed");
                    continue;
                }
            };
            let penalty = self.relevance_penalty(question, &answer);
            debug!(attempt = attempt + 1, temperature, penalty, "relevance retry");

            if penalty < RETRY_PENALTY {
                return answer;
            }
            if penalty < best_penalty {
                best = answer;
                best_penalty = penalty;
            }
        }

        if best_penalty < initial {
            debug!(from = initial, to = best_penalty, "using improved answer");
        }
        best
    }
}

impl AnswerCalibrator for Calibrator {
    fn calibrate(
        &self,
        question: &str,
        generator: &dyn AnswerGenerator,
    ) -> OracleResult<CalibrationReport> {
        let samples = self.sample(question, generator)?;
        let original_draft = median_by_length(&samples);
        let draft = self.improve_relevance(question, &original_draft, generator);

        let consistency = self_consistency(&samples);
        let violations = self.count_violations(&draft);
        let evidence = self.retrieve_evidence(question);
        let relevance_penalty = self.relevance_penalty(question, &draft);

        let uncertainty = compute_uncertainty(
            consistency,
            &violations,
            evidence.len(),
            relevance_penalty,
            self.top_k,
        );
        let explanation = build_explanation(consistency, &violations, &evidence, relevance_penalty);

        info!(
            samples = samples.len(),
            consistency,
            uncertainty,
            relevance_penalty,
            violations = violations.total(),
            "calibration complete"
        );

        Ok(CalibrationReport {
            draft,
            original_draft,
            consistency: normalize_score(consistency),
            violations,
            uncertainty: normalize_score(uncertainty),
            explanation,
            evidence,
            relevance_penalty: normalize_score(relevance_penalty),
        })
    }
}
