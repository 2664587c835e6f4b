//! Ethics shortcut filter.
//!
//! An ordered list of pattern families checked before any scoring. The
//! first family whose regex matches the lowercased question produces the
//! canned refusal; later families are not evaluated.

use regex::Regex;
use tracing::debug;

use oracle_contracts::{
    error::{OracleError, OracleResult},
    record::{normalize_score, AnswerKind},
    scoring::ShortcutVerdict,
};

use crate::rule::ShortcutConfig;

#[derive(Debug, Clone)]
pub struct EthicsShortcut {
    families: Vec<(String, Regex)>,
    answer: String,
    determinacy: f64,
    deception_prob: f64,
    risk_tags: Vec<String>,
}

impl EthicsShortcut {
    /// Compile the shortcut families.
    ///
    /// Returns `OracleError::ConfigError` naming the family whose pattern
    /// does not compile.
    pub fn new(config: &ShortcutConfig) -> OracleResult<Self> {
        let families = config
            .families
            .iter()
            .map(|f| {
                Regex::new(&f.pattern)
                    .map(|re| (f.name.clone(), re))
                    .map_err(|e| OracleError::ConfigError {
                        reason: format!("invalid regex in shortcut family '{}': {}", f.name, e),
                    })
            })
            .collect::<OracleResult<Vec<_>>>()?;

        Ok(Self {
            families,
            answer: config.answer.clone(),
            determinacy: normalize_score(config.determinacy),
            deception_prob: normalize_score(config.deception_prob),
            risk_tags: config.risk_tags.clone(),
        })
    }

    /// Return the refusal verdict if any family matches `question`.
    pub fn check(&self, question: &str) -> Option<ShortcutVerdict> {
        let text = question.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }

        let (family, _) = self.families.iter().find(|(_, re)| re.is_match(&text))?;
        debug!(family = %family, "ethics shortcut family matched");

        Some(ShortcutVerdict {
            answer: self.answer.clone(),
            kind: AnswerKind::EthicalReject,
            determinacy: self.determinacy,
            deception_prob: self.deception_prob,
            risk_tags: self.risk_tags.iter().cloned().collect(),
            family: family.clone(),
        })
    }

    /// Family names in evaluation order.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.families.iter().map(|(name, _)| name.as_str())
    }
}
