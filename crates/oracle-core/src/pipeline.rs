//! The oracle pipeline: drives one question through its lifecycle.
//!
//!   Received → ShortcutChecked → [Scored → Calibrated? → Reflected]
//!            → Hashed → Persisted? → Responded
//!
//! The ethics shortcut has strict priority: when it matches, nothing on the
//! scored path runs and its verdict reaches the ledger unchanged. The ledger
//! append is the only durable side effect and happens exactly once, after
//! every generator call has returned or been abandoned.

use std::sync::Arc;

use tracing::{debug, info, warn};

use oracle_contracts::{
    calibration::CalibrationReport,
    error::{OracleError, OracleResult},
    exchange::{ExchangeStage, OracleResponse, RequestId},
    record::{AnswerKind, Language, RecordDraft},
    scoring::DeceptionLevel,
};

use crate::{
    config::{OracleConfig, ReflectionConfig},
    generator::TimeoutGenerator,
    trace::reason_trace,
    traits::{AnswerCalibrator, AnswerGenerator, AuditWriter, BeliefStore, PolicyEngine},
};

/// Instruction prepended to daily/emotional questions sent to the generator.
const HUMANIZE_PROMPT: &str = "You are a kind, grounded assistant. Speak briefly, warm and clear. \
     Acknowledge feelings first, then give 1-2 concrete, safe suggestions. \
     Never provide illegal, medical, or financial instructions.";

/// Sampling temperature for the humanizing rewrite.
const HUMANIZE_TEMPERATURE: f64 = 0.7;

/// The question-answering pipeline.
///
/// One `Oracle` serves every request; it holds no per-request state, so it
/// can be shared behind an `Arc` across request-handling threads. The chain
/// head lives in the `AuditWriter`, which serializes appends.
pub struct Oracle {
    policy: Box<dyn PolicyEngine>,
    ledger: Arc<dyn AuditWriter>,
    generator: Option<TimeoutGenerator>,
    calibrator: Option<Box<dyn AnswerCalibrator>>,
    beliefs: Option<Box<dyn BeliefStore>>,
    config: OracleConfig,
}

impl Oracle {
    /// Create a pipeline with no generator, calibrator or belief store.
    pub fn new(
        policy: Box<dyn PolicyEngine>,
        ledger: Arc<dyn AuditWriter>,
        config: OracleConfig,
    ) -> Self {
        Self {
            policy,
            ledger,
            generator: None,
            calibrator: None,
            beliefs: None,
            config,
        }
    }

    /// Attach an external generator, bounded by `generator_timeout_ms`.
    pub fn with_generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(TimeoutGenerator::new(
            generator,
            self.config.generator_timeout(),
        ));
        self
    }

    /// Attach a calibrator; it only runs when `calibrate = true` and a
    /// generator is attached.
    pub fn with_calibrator(mut self, calibrator: Box<dyn AnswerCalibrator>) -> Self {
        self.calibrator = Some(calibrator);
        self
    }

    pub fn with_beliefs(mut self, beliefs: Box<dyn BeliefStore>) -> Self {
        self.beliefs = Some(beliefs);
        self
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Answer one question and append it to the ledger.
    ///
    /// # Errors
    ///
    /// `EmptyQuestion` for blank input, in which case nothing is written.
    /// Under strict durability a storage failure is returned as
    /// `LedgerWriteFailed`. Generator, calibration, scoring and belief-store
    /// failures are absorbed and logged.
    pub fn ask(&self, question: &str) -> OracleResult<OracleResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(OracleError::EmptyQuestion);
        }

        let request_id = RequestId::new();
        let mut stages = vec![ExchangeStage::Received];
        let language = Language::detect(question);

        debug!(request_id = %request_id.0, %language, "exchange received");

        let shortcut = self.policy.shortcut(question);
        stages.push(ExchangeStage::ShortcutChecked);

        let mut calibration: Option<CalibrationReport> = None;

        let (answer, kind, determinacy, deception_prob, risk_tags, ethical_weight, explanation) =
            match shortcut {
                Some(verdict) => {
                    info!(
                        request_id = %request_id.0,
                        family = %verdict.family,
                        "ethics shortcut matched; scoring skipped"
                    );
                    let explanation = format!("ethics shortcut: {}", verdict.family);
                    (
                        verdict.answer,
                        verdict.kind,
                        verdict.determinacy,
                        verdict.deception_prob,
                        verdict.risk_tags,
                        self.config.base_ethical_weight,
                        explanation,
                    )
                }
                None => {
                    let score = self.policy.score(question);
                    stages.push(ExchangeStage::Scored);
                    if score.fallback {
                        warn!(request_id = %request_id.0, "scorer fell back to neutral default");
                    }

                    let composed = self.policy.compose(question, &score);
                    let mut answer = composed.answer;
                    let mut kind = composed.kind;
                    let answerable = score.level <= DeceptionLevel::Sensitive;

                    if let Some(generator) = self.generator.as_ref().filter(|_| answerable) {
                        if self.policy.wants_humanizing(question) {
                            let prompt = format!("{}\n\n{}", HUMANIZE_PROMPT, question);
                            match generator.generate(&prompt, HUMANIZE_TEMPERATURE) {
                                Ok(text) => {
                                    answer = text;
                                    kind = AnswerKind::HumanizedResponse;
                                }
                                Err(e) => warn!(
                                    request_id = %request_id.0,
                                    error = %e,
                                    "humanizing rewrite failed; keeping original answer"
                                ),
                            }
                        } else if self.config.calibrate {
                            if let Some(calibrator) = &self.calibrator {
                                match calibrator.calibrate(question, generator) {
                                    Ok(report) => {
                                        answer = report.draft.clone();
                                        stages.push(ExchangeStage::Calibrated);
                                        calibration = Some(report);
                                    }
                                    Err(e) => warn!(
                                        request_id = %request_id.0,
                                        error = %e,
                                        "calibration failed; keeping original answer"
                                    ),
                                }
                            }
                        }
                    }

                    let resonance = self.policy.resonate(
                        question,
                        score.determinacy,
                        self.config.base_ethical_weight,
                    );
                    let mut risk_tags = score.risk_tags;
                    risk_tags.extend(resonance.tags.iter().cloned());

                    let reflection = &self.config.reflection;
                    let determinacy = resonance.determinacy * reflection.determinacy_scale;
                    let deception_prob = score.deception_prob * reflection.deception_scale;
                    let answer = reflect_answer(reflection, question, answer);
                    stages.push(ExchangeStage::Reflected);

                    let mut explanation = match &calibration {
                        Some(report) => report.explanation.clone(),
                        None => String::new(),
                    };
                    let intent = &resonance.intent;
                    explanation.push_str(&format!(
                        "{}intent={} topics=[{}] valence={:.2} confidence={:.2}",
                        if explanation.is_empty() { "" } else { " | " },
                        intent.intent,
                        intent.topics.join(","),
                        intent.valence,
                        intent.confidence,
                    ));

                    (
                        answer,
                        kind,
                        determinacy,
                        deception_prob,
                        risk_tags,
                        resonance.ethical_weight,
                        explanation,
                    )
                }
            };

        let draft = RecordDraft {
            question: question.to_string(),
            answer,
            kind,
            determinacy,
            deception_prob,
            risk_tags,
            language,
        }
        .normalized();

        let outcome = self.ledger.append(draft)?;
        stages.push(ExchangeStage::Hashed);
        if outcome.persisted {
            stages.push(ExchangeStage::Persisted);
        }
        let record = outcome.record;

        let consistency_warnings = match &self.beliefs {
            Some(beliefs) => {
                let found = beliefs
                    .detect_contradictions(&record.question, &record.answer)
                    .unwrap_or_else(|e| {
                        warn!(request_id = %request_id.0, error = %e, "contradiction check failed");
                        Vec::new()
                    });
                if let Err(e) = beliefs.record(&record.question, &record.answer) {
                    warn!(request_id = %request_id.0, error = %e, "belief could not be retained");
                }
                found
            }
            None => Vec::new(),
        };

        let reason_trace = reason_trace(
            &record.question,
            record.kind,
            record.determinacy,
            record.deception_prob,
            &record.risk_tags,
        );
        stages.push(ExchangeStage::Responded);

        info!(
            request_id = %request_id.0,
            hash = %record.hash,
            kind = %record.kind,
            persisted = outcome.persisted,
            contradictions = consistency_warnings.len(),
            "exchange answered"
        );

        Ok(OracleResponse {
            request_id,
            record,
            persisted: outcome.persisted,
            ethical_weight,
            explanation,
            reason_trace,
            calibration,
            consistency_warnings,
            reflection_mode: self.config.reflection.mode.clone(),
            stages,
        })
    }
}

/// Add a reflective prefix and footnote to philosophical answers when the
/// reflection weight is high enough.
///
/// The prefix is chosen from the question length so the same question is
/// always decorated the same way.
fn reflect_answer(reflection: &ReflectionConfig, question: &str, answer: String) -> String {
    if reflection.ethical_reflection_weight <= 0.6
        || reflection.prefixes.is_empty()
        || reflection.footnotes.is_empty()
    {
        return answer;
    }

    let lowered = question.to_lowercase();
    if !reflection.keywords.iter().any(|k| lowered.contains(k.as_str())) {
        return answer;
    }

    let seed = question.chars().count();
    let mut decorated = if reflection.prefixes.iter().any(|p| answer.starts_with(p.as_str())) {
        answer
    } else {
        format!("{}{}", reflection.prefixes[seed % reflection.prefixes.len()], answer)
    };
    decorated.push_str(&reflection.footnotes[seed % reflection.footnotes.len()]);
    decorated
}
