//! Templated answers and the humanizing decision.

use oracle_contracts::{
    record::AnswerKind,
    scoring::{ComposedAnswer, DeceptionLevel, ScoreOutcome},
};

use crate::rule::{ComposerConfig, FactualEntry, HumanizingConfig};

/// Drafts answers from the policy templates.
///
/// Order of precedence:
///
/// 1. A factual-table hit, for questions that are at most sensitive.
/// 2. The deception or caution answer, by deception probability.
/// 3. The harmony answer for high-determinacy, low-risk questions.
/// 4. The first topic template with a marker in the question.
/// 5. The default answer.
///
/// The answer kind follows the scored level, except that philosophical
/// templates answer clear questions with `wisdom`.
#[derive(Debug, Clone)]
pub struct Composer {
    templates: ComposerConfig,
    factual: Vec<FactualEntry>,
    humanizing: HumanizingConfig,
}

impl Composer {
    pub fn new(
        templates: &ComposerConfig,
        factual: &[FactualEntry],
        humanizing: &HumanizingConfig,
    ) -> Self {
        Self {
            templates: templates.clone(),
            factual: factual.to_vec(),
            humanizing: humanizing.clone(),
        }
    }

    /// Direct answer from the factual table, if any key occurs in the
    /// question.
    pub fn factual_answer(&self, question: &str) -> Option<&str> {
        let text = question.trim().to_lowercase();
        self.factual
            .iter()
            .find(|entry| text.contains(entry.key.as_str()))
            .map(|entry| entry.answer.as_str())
    }

    pub fn compose(&self, question: &str, score: &ScoreOutcome) -> ComposedAnswer {
        let level_kind = score.level.kind();
        let answerable = score.level <= DeceptionLevel::Sensitive;
        let t = &self.templates;

        if answerable {
            if let Some(answer) = self.factual_answer(question) {
                return ComposedAnswer {
                    answer: answer.to_string(),
                    kind: AnswerKind::Truth,
                };
            }
        }

        let text = question.to_lowercase();
        let (answer, wisdom) = if score.deception_prob >= t.deception_answer_at {
            (&t.deception_answer, false)
        } else if score.deception_prob >= t.caution_answer_at {
            (&t.caution_answer, false)
        } else if score.determinacy > 0.85 && score.deception_prob < 0.2 {
            (&t.harmony_answer, true)
        } else if let Some(topic) = t
            .topics
            .iter()
            .find(|topic| topic.markers.iter().any(|m| text.contains(m.as_str())))
        {
            (&topic.answer, topic.wisdom)
        } else {
            (&t.default_answer, false)
        };

        let kind = if wisdom && answerable {
            AnswerKind::Wisdom
        } else {
            level_kind
        };

        ComposedAnswer {
            answer: answer.clone(),
            kind,
        }
    }

    /// True for daily or emotional questions.
    ///
    /// Academic vocabulary always wins. Otherwise a daily keyword, or a very
    /// short question without arithmetic or definition markers, qualifies.
    pub fn wants_humanizing(&self, question: &str) -> bool {
        let text = question.trim().to_lowercase();
        let h = &self.humanizing;
        let contains_any = |list: &[String]| list.iter().any(|k| text.contains(k.as_str()));

        if contains_any(&h.academic) {
            return false;
        }
        if contains_any(&h.daily) {
            return true;
        }
        text.split_whitespace().count() <= h.short_word_limit && !contains_any(&h.short_exclusions)
    }
}
