//! # oracle-contracts
//!
//! Shared types and error contracts for the oracle audit ledger.
//!
//! Every crate in the workspace imports from here. No business logic lives
//! in this crate, only data definitions and the error type.

pub mod belief;
pub mod calibration;
pub mod error;
pub mod exchange;
pub mod record;
pub mod scoring;
pub mod verify;

#[cfg(test)]
mod tests {
    use super::*;
    use calibration::ViolationCounts;
    use error::OracleError;
    use exchange::RequestId;
    use record::{normalize_score, AnswerKind, Language, RecordDraft};
    use scoring::DeceptionLevel;
    use verify::{ChainReport, ClaimResult, VerificationOutcome};

    fn claim_result(hash: &str, ok: bool) -> ClaimResult {
        ClaimResult {
            hash: hash.to_string(),
            ok,
            reason: if ok { None } else { Some("not found".to_string()) },
            backend_prev_hash: None,
            supplied_prev_hash: String::new(),
        }
    }

    // ── Language ─────────────────────────────────────────────────────────────

    #[test]
    fn language_detects_cjk_script() {
        assert_eq!(Language::detect("What is truth?"), Language::En);
        assert_eq!(Language::detect("什么是真理"), Language::Zh);
        assert_eq!(Language::detect("Explain 道 please"), Language::Zh);
        assert_eq!(Language::detect(""), Language::En);
    }

    // ── Score normalization ──────────────────────────────────────────────────

    #[test]
    fn normalize_score_clamps_and_rounds() {
        assert_eq!(normalize_score(1.7), 1.0);
        assert_eq!(normalize_score(-0.2), 0.0);
        assert_eq!(normalize_score(0.456), 0.46);
        assert_eq!(normalize_score(f64::NAN), 0.0);
    }

    #[test]
    fn draft_normalized_bounds_both_scores() {
        let draft = RecordDraft {
            question: "q".to_string(),
            answer: "a".to_string(),
            kind: AnswerKind::Truth,
            determinacy: 3.0,
            deception_prob: -1.0,
            risk_tags: Default::default(),
            language: Language::En,
        }
        .normalized();

        assert_eq!(draft.determinacy, 1.0);
        assert_eq!(draft.deception_prob, 0.0);
    }

    // ── Wire names ───────────────────────────────────────────────────────────

    #[test]
    fn answer_kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&AnswerKind::EthicalReject).unwrap();
        assert_eq!(json, "\"ethical_reject\"");
        assert_eq!(AnswerKind::HumanizedResponse.as_str(), "humanized_response");

        let decoded: AnswerKind = serde_json::from_str("\"wisdom\"").unwrap();
        assert_eq!(decoded, AnswerKind::Wisdom);
    }

    #[test]
    fn deception_level_maps_to_kind() {
        assert_eq!(DeceptionLevel::Clear.kind(), AnswerKind::Truth);
        assert_eq!(DeceptionLevel::Sensitive.kind(), AnswerKind::Truth);
        assert_eq!(DeceptionLevel::Caution.kind(), AnswerKind::Caution);
        assert_eq!(DeceptionLevel::Reject.kind(), AnswerKind::EthicalReject);
    }

    // ── Verification aggregate ───────────────────────────────────────────────

    #[test]
    fn chain_report_outcomes() {
        let all = ChainReport::from_results(vec![claim_result("a", true), claim_result("b", true)]);
        assert!(all.all_ok);
        assert_eq!(all.outcome.status_code(), 200);

        let some =
            ChainReport::from_results(vec![claim_result("a", true), claim_result("b", false)]);
        assert!(!some.all_ok);
        assert_eq!(some.outcome, VerificationOutcome::Partial);
        assert_eq!(some.outcome.status_code(), 207);

        let none = ChainReport::from_results(vec![claim_result("a", false)]);
        assert_eq!(none.outcome, VerificationOutcome::Failed);

        let empty = ChainReport::from_results(Vec::new());
        assert!(empty.all_ok, "an empty claim list is vacuously verified");
    }

    #[test]
    fn violation_counts_total_and_categories() {
        let counts = ViolationCounts {
            overclaim: 2,
            forbidden_domain: 0,
            banned_terms: 1,
        };
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.categories(), vec!["overclaim", "banned_terms"]);
    }

    #[test]
    fn request_id_new_produces_unique_values() {
        let ids: std::collections::HashSet<String> =
            (0..50).map(|_| RequestId::new().0.to_string()).collect();
        assert_eq!(ids.len(), 50);
    }

    // ── OracleError display messages ─────────────────────────────────────────

    #[test]
    fn error_messages_carry_context() {
        let err = OracleError::LedgerWriteFailed {
            reason: "disk full".to_string(),
        };
        assert!(err.to_string().contains("ledger write failed"));
        assert!(err.to_string().contains("disk full"));

        let err = OracleError::GeneratorTimeout { after_ms: 20_000 };
        assert!(err.to_string().contains("20000 ms"));

        assert_eq!(
            OracleError::EmptyQuestion.to_string(),
            "question cannot be empty"
        );
    }
}
