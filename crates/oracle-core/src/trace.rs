//! Human-readable reason trace attached to every response.

use std::collections::BTreeSet;

use oracle_contracts::record::AnswerKind;

const DECEPTION_MARKERS: &[&str] = &["deceiv", "forge", "cheat", "操纵", "欺骗", "伪造"];
const MEDICAL_MARKERS: &[&str] = &["medical", "drug", "chest pain", "用药", "心脏", "诊断"];
const FINANCIAL_MARKERS: &[&str] = &["price", "bitcoin", "stock", "预测", "比特币", "股价"];

/// Build the ordered list of reasons behind a classification.
pub fn reason_trace(
    question: &str,
    kind: AnswerKind,
    determinacy: f64,
    deception_prob: f64,
    risk_tags: &BTreeSet<String>,
) -> Vec<String> {
    let lowered = question.to_lowercase();
    let hits = |markers: &[&str]| markers.iter().any(|m| lowered.contains(m));

    let mut trace = Vec::new();
    if hits(DECEPTION_MARKERS) {
        trace.push("risk: deception-related intent".to_string());
    }
    if hits(MEDICAL_MARKERS) {
        trace.push("risk: medical intent".to_string());
    }
    if hits(FINANCIAL_MARKERS) {
        trace.push("risk: financial prediction intent".to_string());
    }
    trace.push(format!("classify={}", kind));
    trace.push(format!("determinacy={:.2}", determinacy));
    trace.push(format!("deception_prob={:.2}", deception_prob));
    if !risk_tags.is_empty() {
        let tags: Vec<&str> = risk_tags.iter().map(String::as_str).collect();
        trace.push(format!("tags={}", tags.join(",")));
    }
    trace
}
