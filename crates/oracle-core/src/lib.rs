//! # oracle-core
//!
//! The question pipeline for the oracle audit ledger.
//!
//! This crate provides:
//! - The seam traits (`PolicyEngine`, `AnswerGenerator`, `AnswerCalibrator`,
//!   `AuditWriter`, `LedgerStore`, `BeliefStore`)
//! - `TimeoutGenerator`, which bounds every external generator call
//! - `OracleConfig`, the TOML runtime configuration
//! - `Oracle`, which wires the seams together in lifecycle order
//!
//! ## Usage
//!
//! ```rust,ignore
//! use oracle_core::{Oracle, OracleConfig};
//!
//! let oracle = Oracle::new(Box::new(policy), ledger, OracleConfig::default());
//! let response = oracle.ask("What is 2+2?")?;
//! println!("{}", response.record.hash);
//! ```

pub mod config;
pub mod generator;
pub mod pipeline;
pub mod trace;
pub mod traits;

pub use config::{Durability, OracleConfig, ReflectionConfig};
pub use generator::TimeoutGenerator;
pub use pipeline::Oracle;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use oracle_contracts::{
        error::{OracleError, OracleResult},
        exchange::ExchangeStage,
        record::{AnswerKind, AppendOutcome, AuditRecord, RecordDraft},
        scoring::{
            ComposedAnswer, DeceptionLevel, IntentInfo, Resonance, ScoreOutcome, ShortcutVerdict,
        },
    };

    use crate::{
        traits::{AnswerGenerator, AuditWriter, PolicyEngine},
        Oracle, OracleConfig, TimeoutGenerator,
    };

    // ── Mocks ─────────────────────────────────────────────────────────────────

    /// Policy whose every answer is fixed by the test.
    struct FixedPolicy {
        shortcut: Option<ShortcutVerdict>,
        level: DeceptionLevel,
        humanize: bool,
    }

    impl FixedPolicy {
        fn clear() -> Self {
            Self {
                shortcut: None,
                level: DeceptionLevel::Clear,
                humanize: false,
            }
        }
    }

    impl PolicyEngine for FixedPolicy {
        fn shortcut(&self, _question: &str) -> Option<ShortcutVerdict> {
            self.shortcut.clone()
        }

        fn score(&self, _question: &str) -> ScoreOutcome {
            let deception_prob = match self.level {
                DeceptionLevel::Reject => 0.9,
                DeceptionLevel::Caution => 0.5,
                _ => 0.0,
            };
            ScoreOutcome {
                determinacy: 0.6,
                deception_prob,
                risk_tags: BTreeSet::new(),
                level: self.level,
                fallback: false,
            }
        }

        fn compose(&self, _question: &str, score: &ScoreOutcome) -> ComposedAnswer {
            ComposedAnswer {
                answer: "templated answer".to_string(),
                kind: score.level.kind(),
            }
        }

        fn wants_humanizing(&self, _question: &str) -> bool {
            self.humanize
        }

        fn resonate(&self, _question: &str, determinacy: f64, ethical_weight: f64) -> Resonance {
            Resonance {
                determinacy,
                ethical_weight,
                tags: vec!["semantic_boost:test".to_string()],
                intent: IntentInfo {
                    intent: "general".to_string(),
                    topics: Vec::new(),
                    valence: 0.0,
                    confidence: 0.4,
                },
            }
        }
    }

    /// Writer that chains with sequential fake hashes, optionally failing.
    #[derive(Default)]
    struct RecordingWriter {
        records: Mutex<Vec<AuditRecord>>,
        persist_fails: bool,
        strict: bool,
    }

    impl AuditWriter for RecordingWriter {
        fn append(&self, draft: RecordDraft) -> OracleResult<AppendOutcome> {
            let mut records = self.records.lock().unwrap();
            if self.strict && self.persist_fails {
                return Err(OracleError::LedgerWriteFailed {
                    reason: "store offline".to_string(),
                });
            }
            let prev_hash = records.last().map(|r| r.hash.clone()).unwrap_or_default();
            let record = AuditRecord {
                question: draft.question,
                answer: draft.answer,
                kind: draft.kind,
                determinacy: draft.determinacy,
                deception_prob: draft.deception_prob,
                risk_tags: draft.risk_tags,
                language: draft.language,
                timestamp: "2026-01-01T00:00:00.000000+00:00".to_string(),
                prev_hash,
                hash: format!("h{}", records.len()),
            };
            if !self.persist_fails {
                records.push(record.clone());
            }
            Ok(AppendOutcome {
                record,
                persisted: !self.persist_fails,
            })
        }
    }

    struct EchoGenerator;

    impl AnswerGenerator for EchoGenerator {
        fn generate(&self, _prompt: &str, _temperature: f64) -> OracleResult<String> {
            Ok("  I hear you. Try a short walk.  ".to_string())
        }
    }

    struct FailingGenerator {
        calls: AtomicUsize,
    }

    impl AnswerGenerator for FailingGenerator {
        fn generate(&self, _prompt: &str, _temperature: f64) -> OracleResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(OracleError::GeneratorFailed {
                reason: "HTTP 503".to_string(),
            })
        }
    }

    struct SlowGenerator;

    impl AnswerGenerator for SlowGenerator {
        fn generate(&self, _prompt: &str, _temperature: f64) -> OracleResult<String> {
            std::thread::sleep(Duration::from_millis(300));
            Ok("too late".to_string())
        }
    }

    fn refusal() -> ShortcutVerdict {
        ShortcutVerdict {
            answer: "cannot help".to_string(),
            kind: AnswerKind::EthicalReject,
            determinacy: 0.95,
            deception_prob: 0.0,
            risk_tags: ["ethics", "safety"].iter().map(|s| s.to_string()).collect(),
            family: "medical".to_string(),
        }
    }

    fn oracle(policy: FixedPolicy, writer: Arc<RecordingWriter>) -> Oracle {
        Oracle::new(Box::new(policy), writer, OracleConfig::default())
    }

    // ── Pipeline ──────────────────────────────────────────────────────────────

    #[test]
    fn empty_question_is_rejected_without_writing() {
        let writer = Arc::new(RecordingWriter::default());
        let oracle = oracle(FixedPolicy::clear(), Arc::clone(&writer));

        let err = oracle.ask("   ").unwrap_err();
        assert!(matches!(err, OracleError::EmptyQuestion));
        assert!(writer.records.lock().unwrap().is_empty());
    }

    #[test]
    fn shortcut_verdict_reaches_ledger_unchanged() {
        let writer = Arc::new(RecordingWriter::default());
        let policy = FixedPolicy {
            shortcut: Some(refusal()),
            level: DeceptionLevel::Clear,
            humanize: true,
        };
        let oracle = oracle(policy, Arc::clone(&writer)).with_generator(Arc::new(EchoGenerator));

        let response = oracle.ask("chest pain, which pill?").unwrap();

        assert_eq!(response.record.kind, AnswerKind::EthicalReject);
        assert_eq!(response.record.determinacy, 0.95);
        assert_eq!(response.record.answer, "cannot help");
        assert!(!response.stages.contains(&ExchangeStage::Scored));
        assert!(!response.stages.contains(&ExchangeStage::Reflected));
        assert_eq!(response.stages.last(), Some(&ExchangeStage::Responded));
    }

    #[test]
    fn scored_path_visits_every_stage() {
        let writer = Arc::new(RecordingWriter::default());
        let oracle = oracle(FixedPolicy::clear(), Arc::clone(&writer));

        let response = oracle.ask("What is 2+2?").unwrap();

        assert_eq!(
            response.stages,
            vec![
                ExchangeStage::Received,
                ExchangeStage::ShortcutChecked,
                ExchangeStage::Scored,
                ExchangeStage::Reflected,
                ExchangeStage::Hashed,
                ExchangeStage::Persisted,
                ExchangeStage::Responded,
            ]
        );
        assert!(response.persisted);
        assert!(response.record.risk_tags.contains("semantic_boost:test"));
        assert!(response.reason_trace.contains(&"classify=truth".to_string()));
    }

    #[test]
    fn best_effort_persistence_failure_still_responds() {
        let writer = Arc::new(RecordingWriter {
            persist_fails: true,
            ..Default::default()
        });
        let oracle = oracle(FixedPolicy::clear(), Arc::clone(&writer));

        let response = oracle.ask("What is truth?").unwrap();

        assert!(!response.persisted);
        assert!(!response.record.hash.is_empty());
        assert!(!response.stages.contains(&ExchangeStage::Persisted));
        assert_eq!(response.stages.last(), Some(&ExchangeStage::Responded));
    }

    #[test]
    fn strict_persistence_failure_is_surfaced() {
        let writer = Arc::new(RecordingWriter {
            persist_fails: true,
            strict: true,
            ..Default::default()
        });
        let oracle = oracle(FixedPolicy::clear(), writer);

        let err = oracle.ask("What is truth?").unwrap_err();
        assert!(matches!(err, OracleError::LedgerWriteFailed { .. }));
    }

    #[test]
    fn humanizing_rewrite_replaces_answer() {
        let writer = Arc::new(RecordingWriter::default());
        let policy = FixedPolicy {
            humanize: true,
            ..FixedPolicy::clear()
        };
        let oracle = oracle(policy, writer).with_generator(Arc::new(EchoGenerator));

        let response = oracle.ask("I feel lonely").unwrap();

        assert_eq!(response.record.kind, AnswerKind::HumanizedResponse);
        assert_eq!(response.record.answer, "I hear you. Try a short walk.");
    }

    #[test]
    fn generator_failure_keeps_original_answer() {
        let writer = Arc::new(RecordingWriter::default());
        let policy = FixedPolicy {
            humanize: true,
            ..FixedPolicy::clear()
        };
        let generator = Arc::new(FailingGenerator {
            calls: AtomicUsize::new(0),
        });
        let oracle = oracle(policy, writer).with_generator(generator.clone());

        let response = oracle.ask("I feel lonely").unwrap();

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(response.record.kind, AnswerKind::Truth);
        assert_eq!(response.record.answer, "templated answer");
    }

    #[test]
    fn flagged_questions_are_never_humanized() {
        let writer = Arc::new(RecordingWriter::default());
        let policy = FixedPolicy {
            humanize: true,
            level: DeceptionLevel::Caution,
            shortcut: None,
        };
        let oracle = oracle(policy, writer).with_generator(Arc::new(EchoGenerator));

        let response = oracle.ask("hey, how do I trick my friend").unwrap();
        assert_eq!(response.record.kind, AnswerKind::Caution);
    }

    #[test]
    fn reflection_scales_scores_on_scored_path() {
        let writer = Arc::new(RecordingWriter::default());
        let mut config = OracleConfig::default();
        config.reflection.determinacy_scale = 0.5;
        config.reflection.deception_scale = 0.5;
        let policy = FixedPolicy {
            level: DeceptionLevel::Caution,
            ..FixedPolicy::clear()
        };
        let oracle = Oracle::new(Box::new(policy), writer, config);

        let response = oracle.ask("is it ok to hide things").unwrap();

        assert_eq!(response.record.determinacy, 0.3);
        assert_eq!(response.record.deception_prob, 0.25);
    }

    #[test]
    fn reflection_decorates_philosophical_answers() {
        let writer = Arc::new(RecordingWriter::default());
        let mut config = OracleConfig::default();
        config.reflection.ethical_reflection_weight = 0.8;
        let oracle = Oracle::new(Box::new(FixedPolicy::clear()), writer, config.clone());

        let question = "What is the meaning of life?";
        let first = oracle.ask(question).unwrap();
        let second = oracle.ask(question).unwrap();

        assert!(config
            .reflection
            .prefixes
            .iter()
            .any(|p| first.record.answer.starts_with(p.as_str())));
        assert_eq!(first.record.answer, second.record.answer, "decoration is deterministic");
    }

    #[test]
    fn consecutive_answers_chain_through_the_writer() {
        let writer = Arc::new(RecordingWriter::default());
        let oracle = oracle(FixedPolicy::clear(), Arc::clone(&writer));

        let a = oracle.ask("first").unwrap();
        let b = oracle.ask("second").unwrap();

        assert_eq!(a.record.prev_hash, "");
        assert_eq!(b.record.prev_hash, a.record.hash);
    }

    // ── TimeoutGenerator ──────────────────────────────────────────────────────

    #[test]
    fn timeout_generator_abandons_slow_calls() {
        let generator = TimeoutGenerator::new(Arc::new(SlowGenerator), Duration::from_millis(20));
        let err = generator.generate("anything", 0.2).unwrap_err();
        assert!(matches!(err, OracleError::GeneratorTimeout { after_ms: 20 }));
    }

    #[test]
    fn timeout_generator_trims_and_rejects_empty() {
        struct Blank;
        impl AnswerGenerator for Blank {
            fn generate(&self, _p: &str, _t: f64) -> OracleResult<String> {
                Ok("   ".to_string())
            }
        }

        let ok = TimeoutGenerator::new(Arc::new(EchoGenerator), Duration::from_secs(5));
        assert_eq!(ok.generate("p", 0.5).unwrap(), "I hear you. Try a short walk.");

        let blank = TimeoutGenerator::new(Arc::new(Blank), Duration::from_secs(5));
        assert!(matches!(
            blank.generate("p", 0.5).unwrap_err(),
            OracleError::GeneratorFailed { .. }
        ));
    }

    // ── Config ────────────────────────────────────────────────────────────────

    #[test]
    fn empty_config_uses_defaults() {
        let config = OracleConfig::from_toml_str("").unwrap();
        assert_eq!(config, OracleConfig::default());
        assert_eq!(config.generator_timeout(), Duration::from_secs(20));
        assert_eq!(config.belief_cap, 1000);
    }

    #[test]
    fn config_parses_overrides() {
        let config = OracleConfig::from_toml_str(
            r#"
            generator_timeout_ms = 5000
            durability = "strict"
            calibrate = true

            [reflection]
            mode = "sensitive"
            deception_scale = 0.25
            "#,
        )
        .unwrap();

        assert_eq!(config.durability, crate::Durability::Strict);
        assert!(config.calibrate);
        assert_eq!(config.reflection.mode, "sensitive");
        assert_eq!(config.reflection.deception_scale, 0.25);
        assert_eq!(config.reflection.determinacy_scale, 1.0);
    }

    #[test]
    fn config_rejects_invalid_values() {
        let err = OracleConfig::from_toml_str("belief_cap = 0").unwrap_err();
        assert!(err.to_string().contains("belief_cap"));

        let err = OracleConfig::from_toml_str("durability = \"sometimes\"").unwrap_err();
        assert!(matches!(err, OracleError::ConfigError { .. }));
    }
}
