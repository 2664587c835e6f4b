//! # oracle-verify
//!
//! Answer calibration and client-side chain verification.
//!
//! - [`calibrate::Calibrator`] implements `oracle_core::traits::AnswerCalibrator`:
//!   three concurrent samples, median-length draft, bounded relevance
//!   retries, rule violations, evidence retrieval and an additive
//!   uncertainty score.
//! - [`chain::ChainVerifier`] checks client-held `{hash, prev_hash}` claims
//!   against a `LedgerStore`, validating raw request bodies with the
//!   `jsonschema` crate first.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use oracle_verify::{Calibrator, ChainVerifier};
//!
//! let calibrator = Calibrator::new(policy.calibration_rules(), policy.knowledge())?;
//! let report = calibrator.calibrate("What is machine learning?", &generator)?;
//!
//! let verifier = ChainVerifier::new(store)?;
//! let outcome = verifier.verify_json(&body)?.outcome;
//! ```

pub mod calibrate;
pub mod chain;

pub use calibrate::Calibrator;
pub use chain::ChainVerifier;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use oracle_audit::{InMemoryLedgerStore, Ledger};
    use oracle_contracts::{
        calibration::{KnowledgeDoc, ViolationCounts},
        error::{OracleError, OracleResult},
        record::{AnswerKind, Language, RecordDraft},
        verify::{ChainClaim, VerificationOutcome},
    };
    use oracle_core::{
        traits::{AnswerCalibrator, AnswerGenerator, AuditWriter, LedgerStore},
        Durability,
    };
    use oracle_policy::TomlPolicyEngine;

    use super::calibrate::{
        build_explanation, compute_uncertainty, self_consistency, Calibrator,
    };
    use super::chain::{ChainVerifier, REASON_NOT_FOUND, REASON_PREV_MISMATCH};

    // ── Helpers ───────────────────────────────────────────────────────────────

    const ML_QUESTION: &str = "What is machine learning?";
    const ML_ANSWER: &str = "Machine learning fits models to data.";
    const EVASIVE: &str = "The path to understanding is a mystery.";

    fn calibrator() -> Calibrator {
        let policy = TomlPolicyEngine::with_defaults().expect("default policy must load");
        Calibrator::new(policy.calibration_rules(), policy.knowledge())
            .expect("default calibration rules must compile")
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Answers by temperature for sampling and by prompt prefix for
    /// retries, recording every call.
    struct ScriptedGenerator {
        samples: [Option<&'static str>; 3],
        retry: Option<&'static str>,
        calls: Mutex<Vec<(String, f64)>>,
    }

    impl ScriptedGenerator {
        fn new(samples: [Option<&'static str>; 3], retry: Option<&'static str>) -> Self {
            Self {
                samples,
                retry,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, f64)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AnswerGenerator for ScriptedGenerator {
        fn generate(&self, prompt: &str, temperature: f64) -> OracleResult<String> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), temperature));

            let scripted = if prompt == ML_QUESTION {
                let slot = [0.2, 0.5, 0.8]
                    .iter()
                    .position(|t| (t - temperature).abs() < 1e-9);
                slot.and_then(|i| self.samples[i])
            } else {
                self.retry
            };
            scripted.map(str::to_string).ok_or(OracleError::GeneratorFailed {
                reason: format!("no scripted answer at temperature {}", temperature),
            })
        }
    }

    fn ledger_with(questions: &[&str]) -> (Arc<InMemoryLedgerStore>, Vec<(String, String)>) {
        let store = Arc::new(InMemoryLedgerStore::new());
        let ledger = Ledger::new(store.clone(), Durability::Strict);
        let pairs = questions
            .iter()
            .map(|q| {
                let record = ledger
                    .append(RecordDraft {
                        question: q.to_string(),
                        answer: "a".to_string(),
                        kind: AnswerKind::Truth,
                        determinacy: 0.5,
                        deception_prob: 0.0,
                        risk_tags: BTreeSet::new(),
                        language: Language::En,
                    })
                    .unwrap()
                    .record;
                (record.hash, record.prev_hash)
            })
            .collect();
        (store, pairs)
    }

    fn claim(hash: &str, prev_hash: &str) -> ChainClaim {
        ChainClaim {
            hash: hash.to_string(),
            prev_hash: prev_hash.to_string(),
        }
    }

    // ── 1. self-consistency ───────────────────────────────────────────────────

    #[test]
    fn test_self_consistency_mean_pairwise_jaccard() {
        assert_eq!(self_consistency(&strings(&["a b", "b c"])), 1.0 / 3.0);
        assert_eq!(self_consistency(&strings(&["Same words", "same WORDS"])), 1.0);
        assert_eq!(self_consistency(&strings(&["only one"])), 0.5);
        assert_eq!(self_consistency(&[]), 0.5);
        assert_eq!(self_consistency(&strings(&["", ""])), 0.0);
    }

    // ── 2. relevance penalty ──────────────────────────────────────────────────

    #[test]
    fn test_relevance_penalty_detects_evasion() {
        let c = calibrator();
        assert_eq!(c.relevance_penalty(ML_QUESTION, EVASIVE), 0.9);
        assert_eq!(c.relevance_penalty(ML_QUESTION, ML_ANSWER), 0.1);
    }

    #[test]
    fn test_relevance_penalty_bands() {
        let c = calibrator();
        assert_eq!(
            c.relevance_penalty("Describe photosynthesis in plants", "Sunlight is nice."),
            0.8
        );
        assert_eq!(
            c.relevance_penalty("What is the capital of France?", "Paris is the capital of France."),
            0.1
        );
        assert_eq!(
            c.relevance_penalty("What is this?", "anything"),
            0.3,
            "a question of only stop words is neutral"
        );
        // 1 of 5 content words shared: ratio 0.2 falls in the 0.3 band.
        assert_eq!(
            c.relevance_penalty("alpha beta gamma delta epsilon", "alpha"),
            0.3
        );
        // 1 of 6: ratio ≈ 0.17.
        assert_eq!(
            c.relevance_penalty("alpha beta gamma delta epsilon zeta", "alpha"),
            0.6
        );
    }

    // ── 3. violations and evidence ────────────────────────────────────────────

    #[test]
    fn test_count_violations_per_category() {
        let counts = calibrator().count_violations("This is guaranteed, 100% a sure win. Buy now!");
        assert_eq!(
            counts,
            ViolationCounts {
                overclaim: 2,
                forbidden_domain: 1,
                banned_terms: 1,
            }
        );
        assert_eq!(
            calibrator().count_violations("Models may be wrong.").total(),
            0
        );
    }

    #[test]
    fn test_invalid_rule_pattern_is_config_error() {
        let policy = TomlPolicyEngine::with_defaults().unwrap();
        let mut rules = policy.calibration_rules().clone();
        rules.overclaim_patterns.push("(unclosed".to_string());

        match Calibrator::new(&rules, &[]) {
            Err(OracleError::ConfigError { reason }) => assert!(reason.contains("(unclosed")),
            Err(other) => panic!("expected ConfigError, got {other}"),
            Ok(_) => panic!("an invalid pattern must be rejected"),
        }
    }

    #[test]
    fn test_evidence_ranked_by_overlap_then_order() {
        let c = calibrator();
        let titles: Vec<String> = c
            .retrieve_evidence("How does a hash chain detect tampering?")
            .into_iter()
            .map(|d| d.title)
            .collect();
        assert_eq!(
            titles,
            strings(&["Hash-chained audit logs", "SHA-256 hash function", "Blockchain basics"])
        );

        assert_eq!(c.with_top_k(1).retrieve_evidence(ML_QUESTION).len(), 1);
        assert!(calibrator().retrieve_evidence("zzz qqq").is_empty());
    }

    // ── 4. uncertainty and explanation ────────────────────────────────────────

    #[test]
    fn test_uncertainty_weights() {
        let none = ViolationCounts::default();
        let u = compute_uncertainty(1.0, &none, 3, 0.1, 3);
        assert!((u - 0.03).abs() < 1e-9, "got {u}");

        let three = ViolationCounts {
            overclaim: 3,
            ..Default::default()
        };
        let u = compute_uncertainty(0.0, &three, 0, 0.9, 3);
        assert!((u - 0.97).abs() < 1e-9, "got {u}");

        let many = ViolationCounts {
            overclaim: 9,
            forbidden_domain: 9,
            banned_terms: 9,
        };
        assert!(compute_uncertainty(-5.0, &many, 0, 5.0, 0) <= 1.0, "clamped");
    }

    #[test]
    fn test_explanation_text() {
        let violations = ViolationCounts {
            overclaim: 1,
            forbidden_domain: 0,
            banned_terms: 2,
        };
        let evidence = vec![
            KnowledgeDoc {
                title: "SHA-256 hash function".to_string(),
                text: String::new(),
            },
            KnowledgeDoc {
                title: "Hash-chained audit logs".to_string(),
                text: String::new(),
            },
        ];
        assert_eq!(
            build_explanation(2.0 / 3.0, &violations, &evidence, 0.6),
            "Self-consistency: 0.67 (higher is better). Rule violations: 3 (overclaim, banned_terms). \
             Answer relevance: low - limited connection to question. \
             Evidence: SHA-256 hash function; Hash-chained audit logs."
        );

        let quiet = build_explanation(1.0, &ViolationCounts::default(), &[], 0.1);
        assert!(quiet.contains("Rule violations: none detected."));
        assert!(quiet.contains("Answer relevance: high - directly addresses question."));
        assert!(quiet.ends_with("Evidence: none retrieved."));
    }

    // ── 5. calibration runs ───────────────────────────────────────────────────

    #[test]
    fn test_relevant_draft_skips_retries() {
        let generator = ScriptedGenerator::new(
            [
                Some(ML_ANSWER),
                Some("Machine learning learns patterns from data."),
                Some("Machine learning is a field where models learn from data examples."),
            ],
            None,
        );
        let report = calibrator().calibrate(ML_QUESTION, &generator).unwrap();

        assert_eq!(report.original_draft, "Machine learning learns patterns from data.");
        assert_eq!(report.draft, report.original_draft);
        assert_eq!(report.consistency, 0.32);
        assert_eq!(report.relevance_penalty, 0.1);
        assert_eq!(report.uncertainty, 0.24);
        assert_eq!(report.evidence.len(), 3);
        assert_eq!(report.evidence[0].title, "Machine learning overview");
        assert_eq!(generator.calls().len(), 3, "no retries for a relevant draft");
    }

    #[test]
    fn test_evasive_draft_is_regenerated() {
        let generator = ScriptedGenerator::new(
            [Some(EVASIVE), Some(EVASIVE), Some(EVASIVE)],
            Some(ML_ANSWER),
        );
        let report = calibrator().calibrate(ML_QUESTION, &generator).unwrap();

        assert_eq!(report.original_draft, EVASIVE);
        assert_eq!(report.draft, ML_ANSWER);
        assert_eq!(report.relevance_penalty, 0.1);

        let calls = generator.calls();
        assert_eq!(calls.len(), 4, "first retry succeeds and stops the loop");
        let (prompt, temperature) = &calls[3];
        assert_eq!(prompt, "Provide a direct technical answer: What is machine learning?");
        assert!((temperature - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_unimproved_retries_keep_original_draft() {
        let generator = ScriptedGenerator::new(
            [Some(EVASIVE), Some(EVASIVE), Some(EVASIVE)],
            Some("Wisdom is a deeper path."),
        );
        let report = calibrator().calibrate(ML_QUESTION, &generator).unwrap();

        assert_eq!(report.draft, EVASIVE);
        assert_eq!(report.relevance_penalty, 0.9);
        assert!(report.explanation.contains("possible evasion detected"));

        let calls = generator.calls();
        assert_eq!(calls.len(), 6);
        let temperatures: Vec<f64> = calls[3..].iter().map(|(_, t)| *t).collect();
        assert!((temperatures[1] - 0.75).abs() < 1e-9);
        assert!((temperatures[2] - 0.9).abs() < 1e-9);
        assert!(calls[5].0.starts_with("Give a clear response without philosophy: "));
    }

    #[test]
    fn test_failed_samples_are_dropped() {
        let generator = ScriptedGenerator::new([Some(ML_ANSWER), None, Some(ML_ANSWER)], None);
        let report = calibrator().calibrate(ML_QUESTION, &generator).unwrap();
        assert_eq!(report.draft, ML_ANSWER);
        assert_eq!(report.consistency, 1.0);
    }

    #[test]
    fn test_all_samples_failing_is_an_error() {
        let generator = ScriptedGenerator::new([None, None, None], None);
        let err = calibrator().calibrate(ML_QUESTION, &generator).unwrap_err();
        assert!(matches!(err, OracleError::GeneratorFailed { .. }));
    }

    // ── 6. chain verification ─────────────────────────────────────────────────

    #[test]
    fn test_tampered_prev_hash_is_partial() {
        let (store, pairs) = ledger_with(&["A", "B"]);
        let verifier = ChainVerifier::new(store).unwrap();
        let (a_hash, a_prev) = &pairs[0];
        let (b_hash, _) = &pairs[1];

        let report = verifier
            .verify(&[claim(a_hash, a_prev), claim(b_hash, &"0".repeat(64))])
            .unwrap();

        assert!(!report.all_ok);
        assert_eq!(report.outcome, VerificationOutcome::Partial);
        assert_eq!(report.outcome.status_code(), 207);
        assert!(report.results[0].ok, "the untouched pair passes");
        assert!(!report.results[1].ok, "the tampered pair fails");
        assert_eq!(report.results[1].reason.as_deref(), Some(REASON_PREV_MISMATCH));
        assert_eq!(report.results[1].backend_prev_hash.as_deref(), Some(a_hash.as_str()));
    }

    #[test]
    fn test_unknown_hash_is_not_found() {
        let (store, _) = ledger_with(&["A"]);
        let verifier = ChainVerifier::new(store).unwrap();

        let report = verifier.verify(&[claim("deadbeef", "")]).unwrap();
        assert_eq!(report.outcome, VerificationOutcome::Failed);
        assert_eq!(report.outcome.status_code(), 409);
        assert_eq!(report.results[0].reason.as_deref(), Some(REASON_NOT_FOUND));
        assert!(report.results[0].backend_prev_hash.is_none());

        let empty = verifier.verify(&[]).unwrap();
        assert_eq!(empty.outcome, VerificationOutcome::Verified);
    }

    #[test]
    fn test_verify_json_accepts_claim_list() {
        let (store, pairs) = ledger_with(&["A", "B", "C"]);
        let verifier = ChainVerifier::new(store.clone()).unwrap();

        let body = json!([
            { "hash": pairs[0].0 },
            { "hash": pairs[1].0, "prev_hash": pairs[1].1 },
            { "hash": pairs[2].0, "prev_hash": pairs[2].1, "note": "extra fields are ignored" },
        ]);
        let report = verifier.verify_json(&body).unwrap();
        assert!(report.all_ok, "missing prev_hash means genesis: {:?}", report.results);
        assert_eq!(report.results.len(), store.all_in_order().unwrap().len());
    }

    #[test]
    fn test_verify_json_rejects_malformed_body() {
        let (store, _) = ledger_with(&[]);
        let verifier = ChainVerifier::new(store).unwrap();

        for body in [
            json!({ "hash": "abc" }),
            json!([{ "hash": 42 }]),
            json!([{ "prev_hash": "abc" }]),
        ] {
            match verifier.verify_json(&body) {
                Err(OracleError::SchemaValidation { reason }) => assert!(!reason.is_empty()),
                other => panic!("expected SchemaValidation for {body}, got {other:?}"),
            }
        }
    }
}
