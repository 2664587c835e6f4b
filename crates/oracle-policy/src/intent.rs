//! Semantic intent inference and the ethical-resonance adjustment.
//!
//! Intent is a coarse reading of the question: which topics it touches,
//! whether its tone leans harmful or benign, and how confident that reading
//! is. Resonance then nudges determinacy and ethical weight:
//!
//! | condition                       | effect                                       |
//! |---------------------------------|----------------------------------------------|
//! | valence < -0.4                  | weight += 0.1·conf (≤ 0.85), det -= 0.07·conf (≥ 0.4) |
//! | `risk` topic or `ethical_risk`  | weight += 0.08 (≤ 0.9)                       |
//! | `ethics` or `truth` topic       | det += 0.05 (≤ 0.9)                          |
//!
//! Finally determinacy is clamped to `[0.3, 0.95]` and ethical weight to
//! `[0.6, 0.9]`.

use oracle_contracts::{
    record::normalize_score,
    scoring::{IntentInfo, Resonance},
};

use crate::rule::{IntentConfig, IntentTopic};

pub const TAG_NEGATIVE_VALENCE: &str = "ethical_resonance:negative_valence";
pub const TAG_RISK_TOPIC: &str = "ethical_resonance:risk_topic";
pub const TAG_PHILOSOPHY_TRUTH: &str = "semantic_boost:philosophy_truth";

#[derive(Debug, Clone)]
pub struct IntentResonator {
    topics: Vec<IntentTopic>,
    positive_tone: Vec<String>,
    negative_tone: Vec<String>,
}

impl IntentResonator {
    pub fn new(config: &IntentConfig) -> Self {
        Self {
            topics: config.topics.clone(),
            positive_tone: config.positive_tone.clone(),
            negative_tone: config.negative_tone.clone(),
        }
    }

    pub fn infer(&self, question: &str) -> IntentInfo {
        let text = question.to_lowercase();

        let topics: Vec<String> = self
            .topics
            .iter()
            .filter(|t| t.keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|t| t.name.clone())
            .collect();

        let hits = |list: &[String]| list.iter().filter(|k| text.contains(k.as_str())).count();
        let positive = hits(&self.positive_tone) as f64;
        let negative = hits(&self.negative_tone) as f64;
        let valence = if positive + negative == 0.0 {
            0.0
        } else {
            ((positive - negative) / (positive + negative)).clamp(-1.0, 1.0)
        };

        let strong_tone = if valence.abs() >= 0.5 { 0.1 } else { 0.0 };
        let confidence = (0.4 + 0.15 * topics.len() as f64 + strong_tone).min(1.0);

        let has = |name: &str| topics.iter().any(|t| t == name);
        let intent = if has("risk") || valence < -0.4 {
            "ethical_risk"
        } else if has("ethics") || has("truth") {
            "philosophy"
        } else {
            "general"
        };

        IntentInfo {
            intent: intent.to_string(),
            topics,
            valence,
            confidence: normalize_score(confidence),
        }
    }

    /// Infer intent and apply the resonance adjustment.
    pub fn resonate(&self, question: &str, determinacy: f64, ethical_weight: f64) -> Resonance {
        let intent = self.infer(question);
        let has = |name: &str| intent.topics.iter().any(|t| t == name);

        let mut det = determinacy;
        let mut weight = ethical_weight;
        let mut tags = Vec::new();

        if intent.valence < -0.4 {
            weight = (weight + 0.1 * intent.confidence).min(0.85);
            det = (det - 0.07 * intent.confidence).max(0.4);
            tags.push(TAG_NEGATIVE_VALENCE.to_string());
        }
        if has("risk") || intent.intent == "ethical_risk" {
            weight = (weight + 0.08).min(0.9);
            tags.push(TAG_RISK_TOPIC.to_string());
        }
        if has("ethics") || has("truth") {
            det = (det + 0.05).min(0.9);
            tags.push(TAG_PHILOSOPHY_TRUTH.to_string());
        }

        Resonance {
            determinacy: normalize_score(det.clamp(0.3, 0.95)),
            ethical_weight: normalize_score(weight.clamp(0.6, 0.9)),
            tags,
            intent,
        }
    }
}
